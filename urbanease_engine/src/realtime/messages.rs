use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db_types::{NewNotification, Notification, Order};

/// Client request to subscribe to a user room.
pub const JOIN_EVENT: &str = "join";
pub const LEAVE_EVENT: &str = "leave";
/// Acknowledges a join.
pub const JOINED_EVENT: &str = "joined";
pub const ERROR_EVENT: &str = "error";
/// The legacy status push that older storefront builds listen for.
pub const ORDER_STATUS_EVENT: &str = "order status update";
pub const NOTIFICATION_EVENT: &str = "notification:new";

/// A single realtime frame, serialized as `{"event": ..., "data": ...}` in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeMessage {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl RealtimeMessage {
    pub fn new<S: Into<String>>(event: S, data: Value) -> Self {
        Self { event: event.into(), data }
    }

    pub fn order_status(order: &Order) -> Self {
        Self::new(
            ORDER_STATUS_EVENT,
            json!({
                "orderId": order.id,
                "status": order.status,
                "updatedAt": order.updated_at,
            }),
        )
    }

    pub fn notification(notification: &Notification) -> Self {
        Self::new(
            NOTIFICATION_EVENT,
            json!({
                "_id": notification.id,
                "id": notification.id,
                "type": notification.kind,
                "title": notification.title,
                "message": notification.message,
                "order": notification.order_id,
                "status": notification.status,
                "read": notification.read,
                "createdAt": notification.created_at,
            }),
        )
    }

    /// A `notification:new` frame for a notice that could not be stored. It carries no id and is stamped now.
    pub fn unsaved_notification(notification: &NewNotification) -> Self {
        Self::new(
            NOTIFICATION_EVENT,
            json!({
                "type": notification.kind,
                "title": notification.title,
                "message": notification.message,
                "order": notification.order_id,
                "status": notification.status,
                "read": false,
                "createdAt": Utc::now(),
            }),
        )
    }

    pub fn joined(room: &str) -> Self {
        Self::new(JOINED_EVENT, json!({ "userId": room }))
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self::new(ERROR_EVENT, json!({ "message": message.into() }))
    }

    pub fn is(&self, event: &str) -> bool {
        self.event == event
    }
}
