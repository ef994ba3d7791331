mod api;
pub mod auth;
pub mod config;
pub mod pages;
mod server;
mod workspaces;

pub use api::ApiError;
pub use auth::TokenGate;
pub use config::{ConfigError, StudioConfig};
pub use server::{build_router, build_workspaces, cors_layer, serve, AppState};
pub use workspaces::Workspaces;
