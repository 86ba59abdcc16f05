pub mod config;
pub mod http;
pub mod scheduler;

pub use config::AppConfig;
pub use http::{AppState, ServeConfig, build_router, serve};
