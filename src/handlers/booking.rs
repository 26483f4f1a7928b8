use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::services::lifecycle::{self, BookingSubmission};
use crate::state::AppState;

// POST /api/booking-request
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(input): Json<BookingSubmission>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = lifecycle::submit_booking(&state, input).await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "id": booking.id,
        "pricing": booking.pricing,
    })))
}
