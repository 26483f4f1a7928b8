use chrono::{Datelike, Duration, NaiveDate};

use crate::models::pricing::{round2, NightlyRate, PricingBreakdown};

pub const CLEANING_FEE: f64 = 100.0;
pub const ANIMAL_FEE_PER_NIGHT: f64 = 10.0;
pub const WOOD_PRICE_PER_QUARTER: f64 = 40.0;
pub const VISITOR_FEE: f64 = 50.0;
pub const EXTRA_SLEEPER_FEE_PER_NIGHT: f64 = 50.0;
pub const EARLY_ARRIVAL_FEE: f64 = 70.0;
pub const LATE_DEPARTURE_FEE: f64 = 70.0;
pub const TOURIST_TAX_PER_ADULT_NIGHT: f64 = 3.93;

/// Stay parameters as validated at submission time.
#[derive(Debug, Clone)]
pub struct StayParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub adults: i64,
    pub animals_count: i64,
    pub wood_quarters: i64,
    pub visitors_count: i64,
    pub extra_sleepers_count: i64,
    pub extra_sleepers_nights: i64,
    pub early_arrival: bool,
    pub late_departure: bool,
}

/// Per-night rate. Holiday dates override the seasonal month rate.
pub fn nightly_rate(date: NaiveDate) -> f64 {
    const HOLIDAY_RATES: &[(u32, u32, f64)] = &[
        (12, 24, 200.0),
        (12, 25, 300.0),
        (12, 26, 200.0),
        (12, 31, 200.0),
        (1, 1, 300.0),
        (1, 2, 200.0),
    ];

    for &(m, d, rate) in HOLIDAY_RATES {
        if date.month() == m && date.day() == d {
            return rate;
        }
    }

    match date.month() {
        8 => 500.0,
        7 => 450.0,
        6 => 400.0,
        5 => 300.0,
        4 => 250.0,
        9 => 250.0,
        10 | 11 | 12 | 1 | 2 | 3 => 170.0,
        _ => 250.0,
    }
}

pub fn nights_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days().max(0)
}

/// Computes the full itemized breakdown from stay parameters. Inverted or
/// equal dates yield zero nights and an all-zero breakdown; the caller is
/// responsible for rejecting such stays before treating the result as a
/// price. Intermediate sums stay unrounded; each line is rounded to the cent
/// when the breakdown is assembled.
pub fn compute_pricing(params: &StayParams) -> PricingBreakdown {
    let nights = nights_between(params.start_date, params.end_date);
    if nights <= 0 {
        return zero_breakdown();
    }

    let mut nightly = Vec::with_capacity(nights as usize);
    let mut base = 0.0;
    for offset in 0..nights {
        let date = params.start_date + Duration::days(offset);
        let rate = nightly_rate(date);
        base += rate;
        nightly.push(NightlyRate { date, rate });
    }

    let adults = params.adults.max(0);
    let animals_count = params.animals_count.max(0);
    let wood_quarters = params.wood_quarters.max(0);
    let visitors_count = params.visitors_count.max(0);
    let extra_count = params.extra_sleepers_count.max(0);
    // A guest cannot be billed for more extra nights than the stay lasts.
    let extra_nights = params.extra_sleepers_nights.max(0).min(nights);

    let animals = animals_count as f64 * ANIMAL_FEE_PER_NIGHT * nights as f64;
    let wood = wood_quarters as f64 * WOOD_PRICE_PER_QUARTER;
    let visitors = visitors_count as f64 * VISITOR_FEE;
    let extra_sleepers = extra_count as f64 * EXTRA_SLEEPER_FEE_PER_NIGHT * extra_nights as f64;
    let early_arrival = if params.early_arrival { EARLY_ARRIVAL_FEE } else { 0.0 };
    let late_departure = if params.late_departure { LATE_DEPARTURE_FEE } else { 0.0 };
    let tourist_tax = adults as f64 * nights as f64 * TOURIST_TAX_PER_ADULT_NIGHT;

    let total = base
        + CLEANING_FEE
        + animals
        + wood
        + visitors
        + extra_sleepers
        + early_arrival
        + late_departure
        + tourist_tax;

    PricingBreakdown {
        currency: "EUR".to_string(),
        base_accommodation: round2(base),
        cleaning: round2(CLEANING_FEE),
        animals: round2(animals),
        wood: round2(wood),
        visitors: round2(visitors),
        extra_sleepers: round2(extra_sleepers),
        early_arrival: round2(early_arrival),
        late_departure: round2(late_departure),
        tourist_tax: round2(tourist_tax),
        total: round2(total),
        nightly,
    }
}

fn zero_breakdown() -> PricingBreakdown {
    PricingBreakdown {
        currency: "EUR".to_string(),
        base_accommodation: 0.0,
        cleaning: 0.0,
        animals: 0.0,
        wood: 0.0,
        visitors: 0.0,
        extra_sleepers: 0.0,
        early_arrival: 0.0,
        late_departure: 0.0,
        tourist_tax: 0.0,
        total: 0.0,
        nightly: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pricing::{balance_after_deposit, deposit_30, round2};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn params(start: NaiveDate, end: NaiveDate) -> StayParams {
        StayParams {
            start_date: start,
            end_date: end,
            adults: 0,
            animals_count: 0,
            wood_quarters: 0,
            visitors_count: 0,
            extra_sleepers_count: 0,
            extra_sleepers_nights: 0,
            early_arrival: false,
            late_departure: false,
        }
    }

    #[test]
    fn test_nightly_rate_holidays() {
        assert_eq!(nightly_rate(d(2025, 12, 24)), 200.0);
        assert_eq!(nightly_rate(d(2025, 12, 25)), 300.0);
        assert_eq!(nightly_rate(d(2025, 12, 26)), 200.0);
        assert_eq!(nightly_rate(d(2025, 12, 31)), 200.0);
        assert_eq!(nightly_rate(d(2026, 1, 1)), 300.0);
        assert_eq!(nightly_rate(d(2026, 1, 2)), 200.0);
    }

    #[test]
    fn test_nightly_rate_seasons() {
        assert_eq!(nightly_rate(d(2025, 8, 15)), 500.0);
        assert_eq!(nightly_rate(d(2025, 7, 10)), 450.0);
        assert_eq!(nightly_rate(d(2025, 6, 1)), 400.0);
        assert_eq!(nightly_rate(d(2025, 5, 1)), 300.0);
        assert_eq!(nightly_rate(d(2025, 4, 1)), 250.0);
        assert_eq!(nightly_rate(d(2025, 9, 30)), 250.0);
        assert_eq!(nightly_rate(d(2025, 1, 15)), 170.0);
        assert_eq!(nightly_rate(d(2025, 11, 3)), 170.0);
    }

    #[test]
    fn test_inverted_dates_price_to_zero() {
        let p = compute_pricing(&params(d(2025, 8, 13), d(2025, 8, 10)));
        assert_eq!(p.total, 0.0);
        assert_eq!(p.cleaning, 0.0);
        assert!(p.nightly.is_empty());

        let p = compute_pricing(&params(d(2025, 8, 10), d(2025, 8, 10)));
        assert_eq!(p.total, 0.0);
    }

    #[test]
    fn test_single_night_spot_checks() {
        let p = compute_pricing(&params(d(2025, 12, 25), d(2025, 12, 26)));
        assert_eq!(p.base_accommodation, 300.0);

        let p = compute_pricing(&params(d(2025, 7, 10), d(2025, 7, 11)));
        assert_eq!(p.base_accommodation, 450.0);

        let p = compute_pricing(&params(d(2025, 1, 15), d(2025, 1, 16)));
        assert_eq!(p.base_accommodation, 170.0);
    }

    #[test]
    fn test_base_is_sum_of_nightly_rates() {
        // Straddles the new year: 170 (Dec 30) + 200 + 300 + 200 + 170 (Jan 3).
        let p = compute_pricing(&params(d(2025, 12, 30), d(2026, 1, 4)));
        assert_eq!(p.nightly.len(), 5);
        assert_eq!(p.base_accommodation, 170.0 + 200.0 + 300.0 + 200.0 + 170.0);
        let summed: f64 = p.nightly.iter().map(|n| n.rate).sum();
        assert_eq!(p.base_accommodation, summed);
    }

    #[test]
    fn test_extra_sleeper_nights_clamped_to_stay() {
        let mut args = params(d(2025, 8, 10), d(2025, 8, 13));
        args.extra_sleepers_count = 1;
        args.extra_sleepers_nights = 10;
        let p = compute_pricing(&args);
        // 1 × 50 × min(10, 3 nights)
        assert_eq!(p.extra_sleepers, 150.0);
    }

    #[test]
    fn test_option_costs() {
        let mut args = params(d(2025, 1, 10), d(2025, 1, 12));
        args.adults = 2;
        args.animals_count = 1;
        args.wood_quarters = 2;
        args.visitors_count = 3;
        args.early_arrival = true;
        args.late_departure = true;
        let p = compute_pricing(&args);
        assert_eq!(p.animals, 20.0); // 1 × 10 × 2 nights
        assert_eq!(p.wood, 80.0); // 2 × 40
        assert_eq!(p.visitors, 150.0); // 3 × 50
        assert_eq!(p.early_arrival, 70.0);
        assert_eq!(p.late_departure, 70.0);
        assert_eq!(p.tourist_tax, round2(2.0 * 2.0 * 3.93));
    }

    #[test]
    fn test_full_august_scenario() {
        let mut args = params(d(2025, 8, 10), d(2025, 8, 13));
        args.adults = 2;
        args.animals_count = 1;
        let p = compute_pricing(&args);
        assert_eq!(p.base_accommodation, 1500.0);
        assert_eq!(p.cleaning, 100.0);
        assert_eq!(p.animals, 30.0);
        assert_eq!(p.tourist_tax, 23.58);
        assert_eq!(p.total, 1653.58);

        let dep = deposit_30(p.total);
        let bal = balance_after_deposit(p.total);
        assert_eq!(round2(dep + bal), p.total);
    }

    #[test]
    fn test_pricing_is_deterministic() {
        let mut args = params(d(2025, 8, 10), d(2025, 8, 13));
        args.adults = 2;
        args.animals_count = 1;
        let a = compute_pricing(&args);
        let b = compute_pricing(&args);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
