pub mod coindcx;
pub mod messages;
pub mod paper;
pub mod traits;
