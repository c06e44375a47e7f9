pub mod aggregator;
pub mod auth;
pub mod dashboard_service;
pub mod geocoding;
pub mod notification_service;
pub mod user_service;
pub mod visit_service;
