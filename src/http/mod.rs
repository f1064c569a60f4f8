pub mod analytics;
pub mod app_error;
pub mod health;
pub mod live;
pub mod scoring;
pub mod server;
pub mod state;
