pub mod auth;
pub mod config;
pub mod credential;
pub mod error;
pub mod gate;
pub mod models;
pub mod openapi;
pub mod repo;
pub mod routes;
pub mod service;

// Re-export commonly used items for tests / external users
pub use gate::AuthGate;
pub use routes::{config, AppState};
