//! Shared utilities
//!
//! - **error**: unified `AppError` / `AppResponse` types
//! - **logger**: tracing initialization

pub mod error;
pub mod logger;

pub use error::{AppError, AppResponse, AppResult, ok};
pub use logger::{init_logger, init_logger_with_file};
