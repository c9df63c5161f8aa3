//! Storefront Reconciliation Server
//!
//! # Architecture Overview
//!
//! The service owns one thing: transitioning order state from untrusted,
//! asynchronous, possibly-duplicated, possibly-out-of-order provider
//! callbacks — exactly once, with downstream side effects isolated from
//! the primary transition.
//!
//! # Module Structure
//!
//! ```text
//! recon-server/src/
//! ├── core/          # Configuration, shared state
//! ├── db/            # Order store (SurrealDB / in-memory), CAS transitions
//! ├── gateways/      # Narrow vendor interfaces + REST clients
//! ├── recon/         # Signature, idempotency, state machines, side effects
//! ├── api/           # HTTP routes and webhook entry points
//! └── utils/         # Errors, logging
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod gateways;
pub mod recon;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, ServerState};
pub use db::{MemoryOrderStore, OrderStore, StoreError, SurrealOrderStore};
pub use recon::{PaymentReconciler, ShipmentReconciler, SideEffectOrchestrator, SweepWorker};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
