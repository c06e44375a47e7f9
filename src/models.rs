pub mod auth;
pub mod client;
pub mod dashboard;
pub mod geo;
pub mod legacy;
pub mod notification;
pub mod profile;
pub mod visit;
