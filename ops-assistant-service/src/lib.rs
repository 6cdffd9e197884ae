pub mod config;
pub mod models;
pub mod service;
pub mod shortcuts;

pub use config::ServiceConfig;
pub use service::{AppState, build_router, create_app};
pub use models::*;
