use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::pricing::PricingBreakdown;

/// Cap on occupants recorded at contract time, regardless of traveller count.
pub const MAX_OCCUPANTS: i64 = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: String,
    pub status: BookingStatus,

    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub nights: i64,
    pub adults: i64,
    pub children: i64,

    pub animals_count: i64,
    pub animal_type: Option<String>,
    pub other_animal_label: Option<String>,
    pub wood_quarters: i64,
    pub visitors_count: i64,
    pub extra_sleepers_count: i64,
    pub extra_sleepers_nights: i64,
    pub early_arrival: bool,
    pub late_departure: bool,

    /// Server-computed snapshot, authoritative for all downstream amounts.
    pub pricing: PricingBreakdown,

    pub created_at: NaiveDateTime,
    pub moderated_at: Option<NaiveDateTime>,
}

impl BookingRequest {
    /// Maximum occupant entries a contract may carry for this booking.
    pub fn occupant_cap(&self) -> i64 {
        (self.adults + self.children).min(MAX_OCCUPANTS)
    }

    /// "2 (chien)" / "1 (autre - furet)" / "0", as shown in emails.
    pub fn animals_summary(&self) -> String {
        if self.animals_count <= 0 {
            return "0".to_string();
        }
        match (self.animal_type.as_deref(), self.other_animal_label.as_deref()) {
            (Some("autre"), Some(label)) if !label.is_empty() => {
                format!("{} (autre - {label})", self.animals_count)
            }
            (Some(kind), _) if !kind.is_empty() => {
                format!("{} ({kind})", self.animals_count)
            }
            _ => format!("{} (—)", self.animals_count),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Refused,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Refused => "refused",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "accepted" => BookingStatus::Accepted,
            "refused" => BookingStatus::Refused,
            _ => BookingStatus::Pending,
        }
    }
}
