use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{balance_after_deposit, deposit_30};
use crate::services::lifecycle::{self, ContractSubmission};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ContractQuery {
    #[serde(default)]
    pub rid: String,
    #[serde(default)]
    pub t: String,
}

// GET /api/contract
//
// Prefill data for the contract page behind a tokenized link.
pub async fn view(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ContractQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    if q.rid.trim().is_empty() {
        return Err(AppError::Validation("rid manquant".to_string()));
    }

    let (booking, contract) = lifecycle::contract_view(&state, &q.rid, &q.t)?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "booking": {
            "id": booking.id,
            "name": booking.name,
            "status": booking.status,
            "start_date": booking.start_date,
            "end_date": booking.end_date,
            "nights": booking.nights,
            "adults": booking.adults,
            "children": booking.children,
            "total": booking.pricing.total,
            "deposit30": deposit_30(booking.pricing.total),
            "balance": balance_after_deposit(booking.pricing.total),
            "occupant_cap": booking.occupant_cap(),
        },
        "contract": contract,
    })))
}

#[derive(Deserialize)]
pub struct ContractActionRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub rid: String,
    #[serde(default)]
    pub t: String,
    #[serde(flatten)]
    pub submission: ContractSubmission,
}

// POST /api/contract
//
// Single action endpoint for the contract page: "send_otp" emails a
// signature code, "verify_otp" signs, "transfer_sent" declares the deposit
// transfer.
pub async fn action(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContractActionRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if req.rid.trim().is_empty() {
        return Err(AppError::Validation("rid manquant".to_string()));
    }

    match req.action.as_str() {
        "send_otp" => {
            lifecycle::send_signature_code(&state, &req.rid, &req.t, &req.submission).await?;
            Ok(Json(serde_json::json!({ "ok": true, "otp_sent": true })))
        }
        "verify_otp" => {
            let (_, deposit30) =
                lifecycle::sign_contract(&state, &req.rid, &req.t, req.submission).await?;
            Ok(Json(serde_json::json!({
                "ok": true,
                "signed": true,
                "deposit30": deposit30,
            })))
        }
        "transfer_sent" => {
            lifecycle::declare_transfer(&state, &req.rid, &req.t).await?;
            Ok(Json(serde_json::json!({ "ok": true, "transfer_declared": true })))
        }
        other => Err(AppError::Validation(format!("action inconnue: {other}"))),
    }
}
