//! Core server infrastructure
//!
//! - **config**: environment-driven configuration
//! - **state**: shared service references

pub mod config;
pub mod state;

pub use config::{Config, PaymentProviderConfig};
pub use state::ServerState;
