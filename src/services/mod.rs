pub mod contract_token;
pub mod lifecycle;
pub mod mailer;
pub mod otp;
pub mod pricing;
pub mod signing;
pub mod templates;
