use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Guest review, moderated through the same signed-link pattern as bookings.
/// Approved reviews are copied into a public-read projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub id: String,
    pub name: String,
    pub rating: i64,
    pub comment: String,
    pub status: ReviewStatus,
    pub created_at: NaiveDateTime,
    pub moderated_at: Option<NaiveDateTime>,
}

/// Public-read projection row, populated when a review is approved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedReview {
    pub id: String,
    pub name: String,
    pub rating: i64,
    pub comment: String,
    pub published_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "approved" => ReviewStatus::Approved,
            "rejected" => ReviewStatus::Rejected,
            _ => ReviewStatus::Pending,
        }
    }
}
