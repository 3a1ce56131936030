pub mod chart_service;
pub mod metrics_service;
pub mod series_service;
pub mod simulation_service;
pub mod transition_service;
