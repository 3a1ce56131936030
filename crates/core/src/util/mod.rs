pub mod calendar;
pub mod numeric;
