//! Order domain types
//!
//! The order document is the single shared mutable resource of the
//! reconciliation core. It is mutated exclusively through verified provider
//! events applied as compare-and-set transitions keyed by `version`.

pub mod event;
pub mod types;

pub use event::{PaymentCaptured, PaymentEvent, PaymentFailed, ShipmentEvent};
pub use types::{
    Address, Order, OrderItem, OrderStatus, PaymentMeta, PaymentStatus, ShipmentInfo,
    ShipmentStatus,
};
