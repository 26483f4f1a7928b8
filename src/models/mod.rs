pub mod booking;
pub mod contract;
pub mod pricing;
pub mod review;

pub use booking::{BookingRequest, BookingStatus, MAX_OCCUPANTS};
pub use contract::{parse_contract_date, BookingContract, Occupant};
pub use pricing::{balance_after_deposit, deposit_30, NightlyRate, PricingBreakdown};
pub use review::{PublishedReview, ReviewStatus, ReviewSubmission};
