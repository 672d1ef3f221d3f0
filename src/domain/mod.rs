pub mod auth_session;
pub mod booking_status;
pub mod charging_stats;
pub mod clock;
pub mod dashboard_view;
pub mod models;
