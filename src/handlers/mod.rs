pub mod booking;
pub mod contract;
pub mod health;
pub mod moderate;
pub mod reviews;
