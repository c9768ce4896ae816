use crate::{
    db::traits::StoreError,
    db_types::{NewOrder, Order, OrderId, OrderStatus, PaymentConfirmation, StatusGuard, UserId},
};

/// Durable order records, and the atomic status and payment mutations that act on them.
///
/// Methods that take an `owner` are scoped to that user: an order belonging to someone else behaves exactly as if it
/// did not exist, and `None` is returned.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order with status `pending` and assigns it a unique order number.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    async fn fetch_order_for_owner(&self, id: OrderId, owner: &UserId) -> Result<Option<Order>, StoreError>;

    /// All orders belonging to `owner`, newest first.
    async fn fetch_orders_for_user(&self, owner: &UserId) -> Result<Vec<Order>, StoreError>;

    /// Every order in the system, newest first.
    async fn fetch_all_orders(&self) -> Result<Vec<Order>, StoreError>;

    /// Sets the order status, provided the current status satisfies `guard`.
    ///
    /// Returns `None` if the order does not exist or the guard rejected the change.
    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        guard: StatusGuard,
    ) -> Result<Option<Order>, StoreError>;

    /// Attaches a `{upi, pending}` payment record to the order if, and only if, it has none yet. Calling this again
    /// is harmless. Returns the (possibly unchanged) order.
    async fn initiate_payment(&self, id: OrderId, owner: &UserId) -> Result<Option<Order>, StoreError>;

    /// Marks the payment as paid and, in the same update, sets the order status to `processing`.
    async fn confirm_payment(
        &self,
        id: OrderId,
        owner: &UserId,
        confirmation: PaymentConfirmation,
    ) -> Result<Option<Order>, StoreError>;

    /// Switches the payment to cash on delivery and, in the same update, sets the order status to `processing`.
    async fn select_cod(&self, id: OrderId, owner: &UserId) -> Result<Option<Order>, StoreError>;

    /// Marks the payment as failed. The order status is left alone.
    async fn decline_payment(&self, id: OrderId, owner: &UserId) -> Result<Option<Order>, StoreError>;
}
