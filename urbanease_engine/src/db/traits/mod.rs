//! Storage contracts for the order engine.
//!
//! Backends implement [`OrderManagement`] and [`NotificationManagement`]. Every mutation described here must be a
//! single atomic conditional update in the backend; callers never read-modify-write.
mod notification_management;
mod order_management;
mod store_error;

pub use notification_management::NotificationManagement;
pub use order_management::OrderManagement;
pub use store_error::StoreError;

/// Convenience bound for code that needs both halves of the storage layer.
pub trait OrderStore: OrderManagement + NotificationManagement {}

impl<T> OrderStore for T where T: OrderManagement + NotificationManagement {}
