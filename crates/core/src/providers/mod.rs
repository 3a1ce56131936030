pub mod traits;

// Data source implementations
pub mod eastmoney;
