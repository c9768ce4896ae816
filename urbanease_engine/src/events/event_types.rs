use crate::db_types::{Order, OrderStatus, Payment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted after a privileged status change has been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub new_status: OrderStatus,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order) -> Self {
        let new_status = order.status;
        Self { order, new_status }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUpdatedEvent {
    pub order: Order,
    pub payment: Option<Payment>,
}

impl PaymentUpdatedEvent {
    pub fn new(order: Order) -> Self {
        let payment = order.payment.clone();
        Self { order, payment }
    }
}
