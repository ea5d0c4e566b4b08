pub mod chart_service;
pub mod dashboard_service;
pub mod participation_api;
pub mod text;
