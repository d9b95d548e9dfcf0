pub mod traits;
pub mod trend_pressure;
