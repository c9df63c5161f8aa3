//! Shared types for the storefront reconciliation core
//!
//! Types that cross the boundary between the reconciliation server and the
//! rest of the application:
//!
//! - **order**: the order document, status enums, provider event records
//! - **util**: timestamp helpers

pub mod order;
pub mod util;

// Re-export 公共类型
pub use order::{
    Address, Order, OrderItem, OrderStatus, PaymentCaptured, PaymentEvent, PaymentFailed,
    PaymentMeta, PaymentStatus, ShipmentEvent, ShipmentInfo, ShipmentStatus,
};
