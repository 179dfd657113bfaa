pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod search;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use routes::{create_router, AppState};
