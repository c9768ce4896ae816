use log::*;

use crate::{
    db::traits::NotificationManagement,
    db_types::{NewNotification, Order},
    realtime::{RealtimeMessage, RealtimePublisher},
};

/// A customer-facing notice about a change to one of their orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerNotice {
    pub title: String,
    pub message: String,
    /// Short status snapshot shown alongside the notice, e.g. "Paid" or "Out for delivery".
    pub status: String,
}

impl OwnerNotice {
    pub fn new<S: Into<String>>(title: S, message: S, status: S) -> Self {
        Self { title: title.into(), message: message.into(), status: status.into() }
    }

    pub fn status_updated(order: &Order) -> Self {
        let label = order.status.label();
        Self::new("Order status updated".to_string(), format!("Your order {} is now {label}.", order.id), label.into())
    }

    pub fn payment_received(order: &Order) -> Self {
        Self::new(
            "Payment received".to_string(),
            format!("Your payment for order {} was marked as paid.", order.id),
            "Paid".into(),
        )
    }

    pub fn cod_selected(order: &Order) -> Self {
        Self::new("COD selected".to_string(), format!("Your order {} will be paid on delivery.", order.id), "COD".into())
    }

    pub fn payment_declined(order: &Order) -> Self {
        Self::new(
            "Payment declined".to_string(),
            format!("The payment for your order {} did not go through. You can try again.", order.id),
            "Payment failed".into(),
        )
    }
}

/// Tells the order owner about a change that has already been committed.
///
/// The notification is stored first, then the legacy status event and the `notification:new` event are pushed to
/// the owner's room. If the store fails, the `notification:new` frame is built from the unsaved notice instead.
/// Every step is best effort. Failures are logged and swallowed since the primary mutation has already succeeded.
pub async fn notify_owner<B, P>(db: &B, publisher: &P, order: &Order, notice: OwnerNotice)
where
    B: NotificationManagement,
    P: RealtimePublisher,
{
    let owner = &order.owner_id;
    let notification = NewNotification::for_order(order, notice.title, notice.message, notice.status);
    let frame = match db.insert_notification(notification.clone()).await {
        Ok(n) => RealtimeMessage::notification(&n),
        Err(e) => {
            warn!("🔄️ Could not store notification for order {} (owner {owner}). {e}", order.id);
            RealtimeMessage::unsaved_notification(&notification)
        },
    };
    if let Err(e) = publisher.publish_to_user(owner, RealtimeMessage::order_status(order)).await {
        warn!("🔄️ Could not push status update for order {} to {owner}. {e}", order.id);
    }
    if let Err(e) = publisher.publish_to_user(owner, frame).await {
        warn!("🔄️ Could not push notification for order {} to {owner}. {e}", order.id);
    }
}
