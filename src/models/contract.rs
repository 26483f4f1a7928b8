use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Occupant {
    pub first_name: String,
    pub last_name: String,
    pub age: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingContract {
    pub booking_id: String,

    pub signer_address_line1: String,
    pub signer_address_line2: Option<String>,
    pub signer_postal_code: String,
    pub signer_city: String,
    pub signer_country: String,

    pub occupants: Vec<Occupant>,
    pub contract_date: NaiveDate,

    /// Terminal marker: once set, the record is append-only.
    pub signed_at: Option<NaiveDateTime>,
    /// Guest's self-declared "deposit transfer sent" timestamp.
    pub transfer_declared_at: Option<NaiveDateTime>,

    pub created_at: NaiveDateTime,
}

impl BookingContract {
    pub fn is_signed(&self) -> bool {
        self.signed_at.is_some()
    }
}

/// Parses a guest-entered contract date: `DD/MM/YYYY` or 8 raw digits
/// `DDMMYYYY`. Both are checked against real calendar rules (no 31/02).
pub fn parse_contract_date(input: &str) -> Option<NaiveDate> {
    let s = input.trim();

    let (d, m, y) = if let Some((day, rest)) = s.split_once('/') {
        let (month, year) = rest.split_once('/')?;
        (
            day.parse::<u32>().ok()?,
            month.parse::<u32>().ok()?,
            year.parse::<i32>().ok()?,
        )
    } else if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        (
            s[0..2].parse::<u32>().ok()?,
            s[2..4].parse::<u32>().ok()?,
            s[4..8].parse::<i32>().ok()?,
        )
    } else {
        return None;
    };

    NaiveDate::from_ymd_opt(y, m, d)
}
