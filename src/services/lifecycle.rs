//! Booking lifecycle: submission, host moderation, contract signature and
//! deposit declaration, plus the review moderation flow. Database writes
//! happen under the connection lock; emails are sent after the lock is
//! released and never fail the request.

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    deposit_30, parse_contract_date, BookingContract, BookingRequest, BookingStatus, Occupant,
    ReviewStatus, ReviewSubmission,
};
use crate::services::contract_token;
use crate::services::otp::OtpAuthenticator;
use crate::services::pricing::{compute_pricing, nights_between, StayParams};
use crate::services::signing::{LinkSigner, ModerationAction, LINK_TTL_SECS};
use crate::services::templates::{self, ModerationLinks, ReviewLinks};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookingSubmission {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub adults: i64,
    #[serde(default)]
    pub children: i64,
    #[serde(default)]
    pub animals_count: i64,
    #[serde(default)]
    pub animal_type: Option<String>,
    #[serde(default)]
    pub other_animal_label: Option<String>,
    #[serde(default)]
    pub wood_quarters: i64,
    #[serde(default)]
    pub visitors_count: i64,
    #[serde(default)]
    pub extra_sleepers_count: i64,
    #[serde(default)]
    pub extra_sleepers_nights: i64,
    #[serde(default)]
    pub early_arrival: bool,
    #[serde(default)]
    pub late_departure: bool,
}

fn validate_submission(input: &BookingSubmission) -> Result<StayParams, AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("Le nom est requis".to_string()));
    }
    let email = input.email.trim();
    if email.is_empty() || !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(AppError::Validation("Email invalide".to_string()));
    }

    let start_date = chrono::NaiveDate::parse_from_str(input.start_date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Date d'arrivée invalide".to_string()))?;
    let end_date = chrono::NaiveDate::parse_from_str(input.end_date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Date de départ invalide".to_string()))?;
    if nights_between(start_date, end_date) <= 0 {
        return Err(AppError::Validation(
            "La date de départ doit être après la date d'arrivée".to_string(),
        ));
    }

    if input.adults < 1 {
        return Err(AppError::Validation(
            "Au moins un adulte est requis".to_string(),
        ));
    }
    if input.children < 0
        || input.animals_count < 0
        || input.wood_quarters < 0
        || input.visitors_count < 0
        || input.extra_sleepers_count < 0
        || input.extra_sleepers_nights < 0
    {
        return Err(AppError::Validation("Valeurs invalides".to_string()));
    }

    Ok(StayParams {
        start_date,
        end_date,
        adults: input.adults,
        animals_count: input.animals_count,
        wood_quarters: input.wood_quarters,
        visitors_count: input.visitors_count,
        extra_sleepers_count: input.extra_sleepers_count,
        extra_sleepers_nights: input.extra_sleepers_nights,
        early_arrival: input.early_arrival,
        late_departure: input.late_departure,
    })
}

fn moderation_links(config: &AppConfig, id: &str, exp: i64) -> ModerationLinks {
    let signer = LinkSigner::new(config.signing_secret.clone());
    let link = |action: ModerationAction| {
        format!(
            "{}/api/moderate?id={id}&action={}&exp={exp}&sig={}",
            config.site_url,
            action.as_str(),
            signer.sign(id, action, exp),
        )
    };
    ModerationLinks {
        accept: link(ModerationAction::Accepted),
        refuse: link(ModerationAction::Refused),
        reply: link(ModerationAction::Reply),
    }
}

fn contract_link(config: &AppConfig, id: &str, email: &str) -> Result<String, AppError> {
    let token = contract_token::create(&config.signing_secret, id, email)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("contract token inputs empty")))?;
    Ok(format!("{}/contract?rid={id}&t={token}", config.site_url))
}

async fn send_logged(state: &AppState, what: &str, email: &crate::services::mailer::OutboundEmail) {
    if let Err(e) = state.mailer.send(email).await {
        tracing::warn!("failed to send {what} email to {}: {e:#}", email.to);
    }
}

/// Validates and persists a new request, prices it server-side, then
/// notifies the host (with signed action links) and acknowledges the guest.
pub async fn submit_booking(
    state: &AppState,
    input: BookingSubmission,
) -> Result<BookingRequest, AppError> {
    let params = validate_submission(&input)?;
    let pricing = compute_pricing(&params);
    let now = Utc::now();

    let booking = BookingRequest {
        id: Uuid::new_v4().to_string(),
        status: BookingStatus::Pending,
        name: input.name.trim().to_string(),
        email: input.email.trim().to_string(),
        phone: input.phone.filter(|p| !p.trim().is_empty()),
        message: input.message.filter(|m| !m.trim().is_empty()),
        start_date: params.start_date,
        end_date: params.end_date,
        nights: nights_between(params.start_date, params.end_date),
        adults: input.adults,
        children: input.children,
        animals_count: input.animals_count,
        animal_type: input.animal_type.filter(|t| !t.trim().is_empty()),
        other_animal_label: input.other_animal_label.filter(|l| !l.trim().is_empty()),
        wood_quarters: input.wood_quarters,
        visitors_count: input.visitors_count,
        extra_sleepers_count: input.extra_sleepers_count,
        extra_sleepers_nights: input.extra_sleepers_nights,
        early_arrival: input.early_arrival,
        late_departure: input.late_departure,
        pricing,
        created_at: now.naive_utc(),
        moderated_at: None,
    };

    {
        let conn = state.db.lock().unwrap();
        queries::create_booking_request(&conn, &booking)?;
    }
    tracing::info!("booking request {} created ({} nights)", booking.id, booking.nights);

    let exp = now.timestamp() + LINK_TTL_SECS;
    let links = moderation_links(&state.config, &booking.id, exp);
    let contract = contract_link(&state.config, &booking.id, &booking.email)?;

    send_logged(
        state,
        "host notification",
        &templates::host_new_request(&state.config, &booking, &links, &contract),
    )
    .await;
    send_logged(
        state,
        "guest acknowledgement",
        &templates::guest_acknowledgement(&state.config, &booking),
    )
    .await;

    Ok(booking)
}

#[derive(Debug)]
pub enum ModerationOutcome {
    Accepted,
    Refused,
    Reply,
    /// The request was moderated before; nothing changed and no email left.
    AlreadyResolved(BookingStatus),
    NotFound,
}

/// Applies a verified moderation action. Resolution happens at most once:
/// the status flips only from `pending`, so a replayed or second link is a
/// no-op and the guest is never re-notified.
pub async fn moderate_booking(
    state: &AppState,
    id: &str,
    action: ModerationAction,
) -> Result<ModerationOutcome, AppError> {
    let booking = {
        let conn = state.db.lock().unwrap();
        queries::get_booking_request(&conn, id)?
    };
    let booking = match booking {
        Some(b) => b,
        None => return Ok(ModerationOutcome::NotFound),
    };

    if action == ModerationAction::Reply {
        return Ok(ModerationOutcome::Reply);
    }

    let status = match action {
        ModerationAction::Accepted => BookingStatus::Accepted,
        _ => BookingStatus::Refused,
    };

    let changed = {
        let conn = state.db.lock().unwrap();
        queries::mark_moderated(&conn, id, status, Utc::now().naive_utc())?
    };
    if !changed {
        tracing::info!("booking {id} already resolved, ignoring {}", action.as_str());
        return Ok(ModerationOutcome::AlreadyResolved(booking.status));
    }

    match status {
        BookingStatus::Accepted => {
            let link = contract_link(&state.config, &booking.id, &booking.email)?;
            send_logged(
                state,
                "guest acceptance",
                &templates::guest_accepted(&state.config, &booking, &link),
            )
            .await;
            Ok(ModerationOutcome::Accepted)
        }
        _ => {
            send_logged(
                state,
                "guest refusal",
                &templates::guest_refused(&state.config, &booking),
            )
            .await;
            Ok(ModerationOutcome::Refused)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("réservation introuvable")]
    NotFound,
    #[error("accès refusé")]
    BadToken,
    #[error("la réservation n'est pas encore acceptée")]
    NotAccepted,
    #[error("le contrat est déjà signé")]
    AlreadySigned,
    #[error("{0}")]
    Validation(String),
    #[error("code invalide ou expiré")]
    BadCode,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ContractError> for AppError {
    fn from(e: ContractError) -> Self {
        match e {
            ContractError::NotFound => AppError::NotFound("réservation introuvable".to_string()),
            ContractError::BadToken => AppError::Unauthorized,
            ContractError::Internal(err) => AppError::Internal(err),
            other => AppError::Validation(other.to_string()),
        }
    }
}

/// Loads the booking behind a contract link and checks its access token
/// against the on-file email.
fn authorize_contract(
    state: &AppState,
    rid: &str,
    token: &str,
) -> Result<BookingRequest, ContractError> {
    let booking = {
        let conn = state.db.lock().unwrap();
        queries::get_booking_request(&conn, rid).map_err(ContractError::Internal)?
    };
    let booking = booking.ok_or(ContractError::NotFound)?;

    if !contract_token::verify(&state.config.signing_secret, rid, &booking.email, token) {
        return Err(ContractError::BadToken);
    }
    Ok(booking)
}

/// Booking and contract state behind a valid contract link.
pub fn contract_view(
    state: &AppState,
    rid: &str,
    token: &str,
) -> Result<(BookingRequest, Option<BookingContract>), ContractError> {
    let booking = authorize_contract(state, rid, token)?;
    let contract = {
        let conn = state.db.lock().unwrap();
        queries::get_contract(&conn, rid).map_err(ContractError::Internal)?
    };
    Ok((booking, contract))
}

/// Emails a fresh signature code to the booking's on-file address. The
/// whole contract form must already validate: no code leaves before the
/// submission is complete, and the requester never chooses the destination.
pub async fn send_signature_code(
    state: &AppState,
    rid: &str,
    token: &str,
    input: &ContractSubmission,
) -> Result<(), ContractError> {
    let booking = authorize_contract(state, rid, token)?;
    if booking.status != BookingStatus::Accepted {
        return Err(ContractError::NotAccepted);
    }

    let existing = {
        let conn = state.db.lock().unwrap();
        queries::get_contract(&conn, rid).map_err(ContractError::Internal)?
    };
    if existing.map(|c| c.is_signed()).unwrap_or(false) {
        return Err(ContractError::AlreadySigned);
    }

    validate_contract(&booking, input)?;

    let code = OtpAuthenticator::new(state.config.signing_secret.clone()).current_code(
        &booking.id,
        &booking.email,
        Utc::now().timestamp(),
    );
    send_logged(
        state,
        "signature code",
        &templates::guest_otp_code(&state.config, &booking, &code),
    )
    .await;
    Ok(())
}

#[derive(Debug, Deserialize, Default)]
pub struct ContractSubmission {
    #[serde(default)]
    pub signer_address_line1: String,
    #[serde(default)]
    pub signer_address_line2: Option<String>,
    #[serde(default)]
    pub signer_postal_code: String,
    #[serde(default)]
    pub signer_city: String,
    #[serde(default)]
    pub signer_country: String,
    #[serde(default)]
    pub contract_date: String,
    #[serde(default)]
    pub occupants: Vec<OccupantInput>,
    #[serde(default)]
    pub accepted_terms: bool,
    #[serde(default)]
    pub otp_code: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OccupantInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub age: String,
}

fn validate_contract(
    booking: &BookingRequest,
    input: &ContractSubmission,
) -> Result<(chrono::NaiveDate, Vec<Occupant>), ContractError> {
    let fail = |msg: &str| Err(ContractError::Validation(msg.to_string()));

    if input.signer_address_line1.trim().is_empty() {
        return fail("L'adresse est requise");
    }
    if input.signer_postal_code.trim().is_empty() {
        return fail("Le code postal est requis");
    }
    if input.signer_city.trim().is_empty() {
        return fail("La ville est requise");
    }
    if input.signer_country.trim().is_empty() {
        return fail("Le pays est requis");
    }
    if !input.accepted_terms {
        return fail("Vous devez accepter le règlement intérieur");
    }

    let contract_date = match parse_contract_date(&input.contract_date) {
        Some(d) => d,
        None => return fail("Date du contrat invalide (JJ/MM/AAAA)"),
    };

    if input.occupants.is_empty() {
        return fail("Au moins un occupant est requis");
    }
    if input.occupants.len() as i64 > booking.occupant_cap() {
        return fail("Nombre d'occupants supérieur à la capacité autorisée");
    }
    let mut occupants = Vec::with_capacity(input.occupants.len());
    for o in &input.occupants {
        if o.first_name.trim().is_empty() || o.last_name.trim().is_empty() || o.age.trim().is_empty()
        {
            return fail("Nom, prénom et âge requis pour chaque occupant");
        }
        occupants.push(Occupant {
            first_name: o.first_name.trim().to_string(),
            last_name: o.last_name.trim().to_string(),
            age: o.age.trim().to_string(),
        });
    }

    Ok((contract_date, occupants))
}

/// Verifies the signature code and records the signed contract. Only
/// accepted bookings can sign, and a signed contract never changes again.
/// On success the guest receives the deposit instructions and the host an
/// internal notice.
pub async fn sign_contract(
    state: &AppState,
    rid: &str,
    token: &str,
    input: ContractSubmission,
) -> Result<(BookingContract, f64), ContractError> {
    let booking = authorize_contract(state, rid, token)?;
    if booking.status != BookingStatus::Accepted {
        return Err(ContractError::NotAccepted);
    }

    let existing = {
        let conn = state.db.lock().unwrap();
        queries::get_contract(&conn, rid).map_err(ContractError::Internal)?
    };
    if existing.map(|c| c.is_signed()).unwrap_or(false) {
        return Err(ContractError::AlreadySigned);
    }

    let (contract_date, occupants) = validate_contract(&booking, &input)?;

    let otp = OtpAuthenticator::new(state.config.signing_secret.clone());
    if !otp.verify(&booking.id, &booking.email, &input.otp_code, Utc::now().timestamp()) {
        tracing::warn!("signature code mismatch for booking {}", booking.id);
        return Err(ContractError::BadCode);
    }

    let now = Utc::now().naive_utc();
    let contract = BookingContract {
        booking_id: booking.id.clone(),
        signer_address_line1: input.signer_address_line1.trim().to_string(),
        signer_address_line2: input
            .signer_address_line2
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
        signer_postal_code: input.signer_postal_code.trim().to_string(),
        signer_city: input.signer_city.trim().to_string(),
        signer_country: input.signer_country.trim().to_string(),
        occupants,
        contract_date,
        signed_at: Some(now),
        transfer_declared_at: None,
        created_at: now,
    };

    {
        let conn = state.db.lock().unwrap();
        queries::upsert_signed_contract(&conn, &contract).map_err(ContractError::Internal)?;
    }
    tracing::info!("contract signed for booking {rid}");

    send_logged(
        state,
        "signed confirmation",
        &templates::guest_signed(&state.config, &booking),
    )
    .await;
    send_logged(
        state,
        "host signed notice",
        &templates::host_signed_notice(&state.config, &booking),
    )
    .await;

    Ok((contract, deposit_30(booking.pricing.total)))
}

/// Records the guest's "deposit transfer sent" declaration. The first
/// declaration notifies the host; repeats are accepted silently.
pub async fn declare_transfer(
    state: &AppState,
    rid: &str,
    token: &str,
) -> Result<(), ContractError> {
    let booking = authorize_contract(state, rid, token)?;

    let marked = {
        let conn = state.db.lock().unwrap();
        let signed = queries::get_contract(&conn, rid)
            .map_err(ContractError::Internal)?
            .map(|c| c.is_signed())
            .unwrap_or(false);
        if !signed {
            return Err(ContractError::Validation(
                "Le contrat doit être signé avant de déclarer le virement".to_string(),
            ));
        }
        queries::mark_transfer_declared(&conn, rid, Utc::now().naive_utc())
            .map_err(ContractError::Internal)?
    };

    if marked {
        send_logged(
            state,
            "transfer declaration",
            &templates::host_transfer_declared(&state.config, &booking),
        )
        .await;
    }
    Ok(())
}

// ── Reviews ──

#[derive(Debug, Deserialize)]
pub struct ReviewInput {
    pub name: String,
    pub rating: i64,
    pub comment: String,
}

fn review_links(config: &AppConfig, id: &str, exp: i64) -> ReviewLinks {
    let signer = LinkSigner::new(config.signing_secret.clone());
    let link = |action: ModerationAction| {
        format!(
            "{}/api/reviews/moderate?id={id}&action={}&exp={exp}&sig={}",
            config.site_url,
            action.as_str(),
            signer.sign(id, action, exp),
        )
    };
    ReviewLinks {
        approve: link(ModerationAction::Accepted),
        reject: link(ModerationAction::Refused),
    }
}

/// Stores a pending review and asks the host to moderate it.
pub async fn submit_review(
    state: &AppState,
    input: ReviewInput,
) -> Result<ReviewSubmission, AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::Validation("Le nom est requis".to_string()));
    }
    if !(1..=5).contains(&input.rating) {
        return Err(AppError::Validation(
            "La note doit être comprise entre 1 et 5".to_string(),
        ));
    }
    if input.comment.trim().is_empty() {
        return Err(AppError::Validation("Le commentaire est requis".to_string()));
    }

    let now = Utc::now();
    let review = ReviewSubmission {
        id: Uuid::new_v4().to_string(),
        name: input.name.trim().to_string(),
        rating: input.rating,
        comment: input.comment.trim().to_string(),
        status: ReviewStatus::Pending,
        created_at: now.naive_utc(),
        moderated_at: None,
    };

    {
        let conn = state.db.lock().unwrap();
        queries::create_review(&conn, &review)?;
    }

    let exp = now.timestamp() + LINK_TTL_SECS;
    let links = review_links(&state.config, &review.id, exp);
    send_logged(
        state,
        "review notification",
        &templates::host_new_review(&state.config, &review.name, review.rating, &review.comment, &links),
    )
    .await;

    Ok(review)
}

#[derive(Debug)]
pub enum ReviewOutcome {
    Approved,
    Rejected,
    AlreadyResolved,
    NotFound,
}

/// Applies a verified review moderation action, once. Approval copies the
/// review into the public projection.
pub fn moderate_review(
    state: &AppState,
    id: &str,
    action: ModerationAction,
) -> Result<ReviewOutcome, AppError> {
    let status = match action {
        ModerationAction::Accepted => ReviewStatus::Approved,
        ModerationAction::Refused => ReviewStatus::Rejected,
        ModerationAction::Reply => return Ok(ReviewOutcome::NotFound),
    };

    let conn = state.db.lock().unwrap();
    let review = match queries::get_review(&conn, id)? {
        Some(r) => r,
        None => return Ok(ReviewOutcome::NotFound),
    };

    let now = Utc::now().naive_utc();
    if !queries::mark_review_moderated(&conn, id, status, now)? {
        return Ok(ReviewOutcome::AlreadyResolved);
    }

    if status == ReviewStatus::Approved {
        queries::publish_review(&conn, &review, now)?;
        Ok(ReviewOutcome::Approved)
    } else {
        Ok(ReviewOutcome::Rejected)
    }
}
