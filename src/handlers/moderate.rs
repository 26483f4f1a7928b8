use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;

use crate::models::BookingStatus;
use crate::services::lifecycle::{self, ModerationOutcome};
use crate::services::signing::LinkSigner;
use crate::state::AppState;

pub const ACCEPTED_PAGE: &str = "/booking/accepted";
pub const REFUSED_PAGE: &str = "/booking/refused";
pub const REPLY_PAGE: &str = "/booking/reply";

#[derive(Deserialize)]
pub struct ModerateQuery {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub exp: String,
    #[serde(default)]
    pub sig: String,
}

fn redirect(to: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, to.to_string())]).into_response()
}

// GET /api/moderate
//
// One-click link from the host's notification email. Every failure mode
// (bad signature, expired, unknown id, malformed parameters) lands on the
// refusal page; an ambiguous link must never read as an acceptance.
pub async fn moderate(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ModerateQuery>,
) -> Response {
    let signer = LinkSigner::new(state.config.signing_secret.clone());
    let action = match signer.verify(&q.id, &q.action, &q.exp, &q.sig, Utc::now().timestamp()) {
        Some(a) => a,
        None => {
            tracing::warn!("invalid moderation link for id {:?}", q.id);
            return redirect(REFUSED_PAGE);
        }
    };

    match lifecycle::moderate_booking(&state, &q.id, action).await {
        Ok(ModerationOutcome::Accepted) => redirect(ACCEPTED_PAGE),
        Ok(ModerationOutcome::Refused) => redirect(REFUSED_PAGE),
        Ok(ModerationOutcome::Reply) => redirect(REPLY_PAGE),
        // A replayed link shows the page matching the recorded status.
        Ok(ModerationOutcome::AlreadyResolved(BookingStatus::Accepted)) => {
            redirect(ACCEPTED_PAGE)
        }
        Ok(ModerationOutcome::AlreadyResolved(_)) => redirect(REFUSED_PAGE),
        Ok(ModerationOutcome::NotFound) => redirect(REFUSED_PAGE),
        Err(e) => {
            tracing::error!("moderation failed for {}: {e}", q.id);
            redirect(REFUSED_PAGE)
        }
    }
}
