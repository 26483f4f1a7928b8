use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use crate::db::queries;
use crate::errors::AppError;
use crate::services::lifecycle::{self, ReviewInput, ReviewOutcome};
use crate::services::signing::LinkSigner;
use crate::state::AppState;

// POST /api/reviews
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ReviewInput>,
) -> Result<Json<serde_json::Value>, AppError> {
    let review = lifecycle::submit_review(&state, input).await?;
    Ok(Json(serde_json::json!({ "ok": true, "id": review.id })))
}

// GET /api/reviews
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let reviews = {
        let conn = state.db.lock().unwrap();
        queries::list_published_reviews(&conn)?
    };
    Ok(Json(serde_json::json!({ "ok": true, "reviews": reviews })))
}

const APPROVED_PAGE: &str = "/reviews/approved";
const REJECTED_PAGE: &str = "/reviews/rejected";

fn redirect(to: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, to.to_string())]).into_response()
}

// GET /api/reviews/moderate
//
// Same fail-safe convention as booking moderation: anything invalid lands
// on the rejection page.
pub async fn moderate(
    State(state): State<Arc<AppState>>,
    Query(q): Query<crate::handlers::moderate::ModerateQuery>,
) -> Response {
    let signer = LinkSigner::new(state.config.signing_secret.clone());
    let action = match signer.verify(&q.id, &q.action, &q.exp, &q.sig, Utc::now().timestamp()) {
        Some(a) => a,
        None => {
            tracing::warn!("invalid review moderation link for id {:?}", q.id);
            return redirect(REJECTED_PAGE);
        }
    };

    match lifecycle::moderate_review(&state, &q.id, action) {
        Ok(ReviewOutcome::Approved) => redirect(APPROVED_PAGE),
        Ok(ReviewOutcome::Rejected) => redirect(REJECTED_PAGE),
        Ok(ReviewOutcome::AlreadyResolved) => redirect(REJECTED_PAGE),
        Ok(ReviewOutcome::NotFound) => redirect(REJECTED_PAGE),
        Err(e) => {
            tracing::error!("review moderation failed for {}: {e}", q.id);
            redirect(REJECTED_PAGE)
        }
    }
}
