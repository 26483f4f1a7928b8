use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Itemized price snapshot, computed once at submission time and persisted
/// as JSON. Every later amount (deposit, balance) derives from this record,
/// never from client input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub currency: String,
    pub base_accommodation: f64,
    pub cleaning: f64,
    pub animals: f64,
    pub wood: f64,
    pub visitors: f64,
    pub extra_sleepers: f64,
    pub early_arrival: f64,
    pub late_departure: f64,
    pub tourist_tax: f64,
    pub total: f64,
    #[serde(default)]
    pub nightly: Vec<NightlyRate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightlyRate {
    pub date: NaiveDate,
    pub rate: f64,
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// 30% deposit, rounded to the cent.
pub fn deposit_30(total: f64) -> f64 {
    round2(total * 0.30)
}

/// Remaining balance after the deposit. Deposit + balance reproduces the
/// stored total exactly.
pub fn balance_after_deposit(total: f64) -> f64 {
    round2(total - deposit_30(total))
}

fn pick_f64(value: &serde_json::Value, aliases: &[&str]) -> Option<f64> {
    for key in aliases {
        if let Some(v) = value.get(key).and_then(|v| v.as_f64()) {
            return Some(v);
        }
    }
    None
}

impl PricingBreakdown {
    /// Reads a stored pricing snapshot, tolerating the column-naming variants
    /// older rows were written with. This is the only place aliases are
    /// resolved; everything past the storage boundary sees the canonical
    /// shape. When no direct accommodation figure exists, it falls back to
    /// the residual (total minus the known parts).
    pub fn from_stored_json(value: &serde_json::Value) -> Self {
        let total = pick_f64(value, &["total", "grand_total", "total_price", "total_eur"])
            .unwrap_or(0.0);
        let cleaning = pick_f64(value, &["cleaning", "cleaning_fee"]).unwrap_or(0.0);
        let animals = pick_f64(value, &["animals", "animal_cost", "pets"]).unwrap_or(0.0);
        let wood = pick_f64(value, &["wood", "wood_cost"]).unwrap_or(0.0);
        let visitors = pick_f64(value, &["visitors", "visitor_cost"]).unwrap_or(0.0);
        let extra_sleepers =
            pick_f64(value, &["extra_sleepers", "extra_people", "extra_people_cost"])
                .unwrap_or(0.0);
        let early_arrival =
            pick_f64(value, &["early_arrival", "early_checkin"]).unwrap_or(0.0);
        let late_departure =
            pick_f64(value, &["late_departure", "late_checkout"]).unwrap_or(0.0);
        let tourist_tax =
            pick_f64(value, &["tourist_tax", "city_tax", "taxe_sejour"]).unwrap_or(0.0);

        let base_accommodation =
            pick_f64(value, &["base_accommodation", "base", "accommodation"])
                .unwrap_or_else(|| {
                    round2(
                        total
                            - cleaning
                            - animals
                            - wood
                            - visitors
                            - extra_sleepers
                            - early_arrival
                            - late_departure
                            - tourist_tax,
                    )
                });

        let nightly = value
            .get("nightly")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        let currency = value
            .get("currency")
            .and_then(|v| v.as_str())
            .unwrap_or("EUR")
            .to_string();

        Self {
            currency,
            base_accommodation,
            cleaning,
            animals,
            wood,
            visitors,
            extra_sleepers,
            early_arrival,
            late_departure,
            tourist_tax,
            total,
            nightly,
        }
    }
}
