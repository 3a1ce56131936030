pub mod analytics;
pub mod chart;
pub mod fund;
pub mod portfolio;
pub mod settings;
pub mod simulation;
