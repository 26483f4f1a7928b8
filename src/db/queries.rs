use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};

use crate::models::{
    BookingContract, BookingRequest, BookingStatus, Occupant, PricingBreakdown, PublishedReview,
    ReviewStatus, ReviewSubmission,
};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

fn fmt_datetime(t: NaiveDateTime) -> String {
    t.format(DATETIME_FMT).to_string()
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FMT).unwrap_or_default()
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_default()
}

// ── Booking requests ──

pub fn create_booking_request(conn: &Connection, req: &BookingRequest) -> anyhow::Result<()> {
    let pricing_json = serde_json::to_string(&req.pricing)?;

    conn.execute(
        "INSERT INTO booking_requests (
            id, status, name, email, phone, message,
            start_date, end_date, nights, adults, children,
            animals_count, animal_type, other_animal_label,
            wood_quarters, visitors_count,
            extra_sleepers_count, extra_sleepers_nights,
            early_arrival, late_departure,
            pricing, created_at, moderated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)",
        params![
            req.id,
            req.status.as_str(),
            req.name,
            req.email,
            req.phone,
            req.message,
            fmt_date(req.start_date),
            fmt_date(req.end_date),
            req.nights,
            req.adults,
            req.children,
            req.animals_count,
            req.animal_type,
            req.other_animal_label,
            req.wood_quarters,
            req.visitors_count,
            req.extra_sleepers_count,
            req.extra_sleepers_nights,
            req.early_arrival as i64,
            req.late_departure as i64,
            pricing_json,
            fmt_datetime(req.created_at),
            req.moderated_at.map(fmt_datetime),
        ],
    )?;
    Ok(())
}

pub fn get_booking_request(conn: &Connection, id: &str) -> anyhow::Result<Option<BookingRequest>> {
    let mut stmt = conn.prepare(
        "SELECT id, status, name, email, phone, message,
                start_date, end_date, nights, adults, children,
                animals_count, animal_type, other_animal_label,
                wood_quarters, visitors_count,
                extra_sleepers_count, extra_sleepers_nights,
                early_arrival, late_departure,
                pricing, created_at, moderated_at
         FROM booking_requests WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, String>(7)?,
            row.get::<_, i64>(8)?,
            row.get::<_, i64>(9)?,
            row.get::<_, i64>(10)?,
            row.get::<_, i64>(11)?,
            row.get::<_, Option<String>>(12)?,
            row.get::<_, Option<String>>(13)?,
            row.get::<_, i64>(14)?,
            row.get::<_, i64>(15)?,
            row.get::<_, i64>(16)?,
            row.get::<_, i64>(17)?,
            row.get::<_, i64>(18)?,
            row.get::<_, i64>(19)?,
            row.get::<_, String>(20)?,
            row.get::<_, String>(21)?,
            row.get::<_, Option<String>>(22)?,
        ))
    });

    match result {
        Ok((
            id,
            status,
            name,
            email,
            phone,
            message,
            start_date,
            end_date,
            nights,
            adults,
            children,
            animals_count,
            animal_type,
            other_animal_label,
            wood_quarters,
            visitors_count,
            extra_sleepers_count,
            extra_sleepers_nights,
            early_arrival,
            late_departure,
            pricing_json,
            created_at,
            moderated_at,
        )) => {
            // Rows written by older exports may use different pricing keys,
            // so the snapshot is read through the alias-tolerant adapter.
            let pricing_value: serde_json::Value =
                serde_json::from_str(&pricing_json).unwrap_or(serde_json::json!({}));
            let pricing = PricingBreakdown::from_stored_json(&pricing_value);

            Ok(Some(BookingRequest {
                id,
                status: BookingStatus::from_str(&status),
                name,
                email,
                phone,
                message,
                start_date: parse_date(&start_date),
                end_date: parse_date(&end_date),
                nights,
                adults,
                children,
                animals_count,
                animal_type,
                other_animal_label,
                wood_quarters,
                visitors_count,
                extra_sleepers_count,
                extra_sleepers_nights,
                early_arrival: early_arrival != 0,
                late_departure: late_departure != 0,
                pricing,
                created_at: parse_datetime(&created_at),
                moderated_at: moderated_at.map(|s| parse_datetime(&s)),
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Resolves a pending request to `accepted` or `refused`. Returns false when
/// the row was already resolved, so a replayed link changes nothing.
pub fn mark_moderated(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
    now: NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE booking_requests SET status = ?1, moderated_at = ?2
         WHERE id = ?3 AND status = 'pending'",
        params![status.as_str(), fmt_datetime(now), id],
    )?;
    Ok(count > 0)
}

// ── Contracts ──

pub fn upsert_signed_contract(conn: &Connection, contract: &BookingContract) -> anyhow::Result<()> {
    let occupants_json = serde_json::to_string(&contract.occupants)?;

    conn.execute(
        "INSERT INTO booking_contracts (
            booking_id, signer_address_line1, signer_address_line2,
            signer_postal_code, signer_city, signer_country,
            occupants, contract_date, signed_at, transfer_declared_at, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(booking_id) DO UPDATE SET
            signer_address_line1 = excluded.signer_address_line1,
            signer_address_line2 = excluded.signer_address_line2,
            signer_postal_code = excluded.signer_postal_code,
            signer_city = excluded.signer_city,
            signer_country = excluded.signer_country,
            occupants = excluded.occupants,
            contract_date = excluded.contract_date,
            signed_at = excluded.signed_at
        WHERE booking_contracts.signed_at IS NULL",
        params![
            contract.booking_id,
            contract.signer_address_line1,
            contract.signer_address_line2,
            contract.signer_postal_code,
            contract.signer_city,
            contract.signer_country,
            occupants_json,
            fmt_date(contract.contract_date),
            contract.signed_at.map(fmt_datetime),
            contract.transfer_declared_at.map(fmt_datetime),
            fmt_datetime(contract.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_contract(conn: &Connection, booking_id: &str) -> anyhow::Result<Option<BookingContract>> {
    let mut stmt = conn.prepare(
        "SELECT booking_id, signer_address_line1, signer_address_line2,
                signer_postal_code, signer_city, signer_country,
                occupants, contract_date, signed_at, transfer_declared_at, created_at
         FROM booking_contracts WHERE booking_id = ?1",
    )?;

    let result = stmt.query_row(params![booking_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, String>(7)?,
            row.get::<_, Option<String>>(8)?,
            row.get::<_, Option<String>>(9)?,
            row.get::<_, String>(10)?,
        ))
    });

    match result {
        Ok((
            booking_id,
            signer_address_line1,
            signer_address_line2,
            signer_postal_code,
            signer_city,
            signer_country,
            occupants_json,
            contract_date,
            signed_at,
            transfer_declared_at,
            created_at,
        )) => {
            let occupants: Vec<Occupant> =
                serde_json::from_str(&occupants_json).unwrap_or_default();

            Ok(Some(BookingContract {
                booking_id,
                signer_address_line1,
                signer_address_line2,
                signer_postal_code,
                signer_city,
                signer_country,
                occupants,
                contract_date: parse_date(&contract_date),
                signed_at: signed_at.map(|s| parse_datetime(&s)),
                transfer_declared_at: transfer_declared_at.map(|s| parse_datetime(&s)),
                created_at: parse_datetime(&created_at),
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Records the guest's transfer declaration once; later calls are no-ops.
pub fn mark_transfer_declared(
    conn: &Connection,
    booking_id: &str,
    now: NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE booking_contracts SET transfer_declared_at = ?1
         WHERE booking_id = ?2 AND signed_at IS NOT NULL AND transfer_declared_at IS NULL",
        params![fmt_datetime(now), booking_id],
    )?;
    Ok(count > 0)
}

// ── Reviews ──

pub fn create_review(conn: &Connection, review: &ReviewSubmission) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO reviews (id, name, rating, comment, status, created_at, moderated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            review.id,
            review.name,
            review.rating,
            review.comment,
            review.status.as_str(),
            fmt_datetime(review.created_at),
            review.moderated_at.map(fmt_datetime),
        ],
    )?;
    Ok(())
}

pub fn get_review(conn: &Connection, id: &str) -> anyhow::Result<Option<ReviewSubmission>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, rating, comment, status, created_at, moderated_at
         FROM reviews WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, Option<String>>(6)?,
        ))
    });

    match result {
        Ok((id, name, rating, comment, status, created_at, moderated_at)) => {
            Ok(Some(ReviewSubmission {
                id,
                name,
                rating,
                comment,
                status: ReviewStatus::from_str(&status),
                created_at: parse_datetime(&created_at),
                moderated_at: moderated_at.map(|s| parse_datetime(&s)),
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn mark_review_moderated(
    conn: &Connection,
    id: &str,
    status: ReviewStatus,
    now: NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE reviews SET status = ?1, moderated_at = ?2
         WHERE id = ?3 AND status = 'pending'",
        params![status.as_str(), fmt_datetime(now), id],
    )?;
    Ok(count > 0)
}

pub fn publish_review(
    conn: &Connection,
    review: &ReviewSubmission,
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO published_reviews (id, name, rating, comment, published_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            review.id,
            review.name,
            review.rating,
            review.comment,
            fmt_datetime(now),
        ],
    )?;
    Ok(())
}

pub fn list_published_reviews(conn: &Connection) -> anyhow::Result<Vec<PublishedReview>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, rating, comment, published_at
         FROM published_reviews ORDER BY published_at DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut reviews = Vec::new();
    for row in rows {
        let (id, name, rating, comment, published_at) = row?;
        reviews.push(PublishedReview {
            id,
            name,
            rating,
            comment,
            published_at: parse_datetime(&published_at),
        });
    }
    Ok(reviews)
}
