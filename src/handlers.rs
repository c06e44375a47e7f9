pub mod auth;
pub mod dashboard;
pub mod geo;
pub mod legacy;
pub mod notifications;
pub mod users;
pub mod visits;
