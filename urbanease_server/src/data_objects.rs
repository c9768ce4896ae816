use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use urbanease_engine::{
    db_types::{Notification, NotificationPage, Order, OrderId, Paise, Pagination, PaymentConfirmation, UserId},
    order_objects::UpiPaymentRequest,
};

/// The envelope every JSON response is wrapped in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T = Value> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> JsonResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, message: None, data: Some(data), error: None }
    }

    pub fn with_message<S: Display>(mut self, message: S) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn with_error<S: Display>(mut self, error: S) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

impl JsonResponse<Value> {
    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: Some(message.to_string()), data: None, error: None }
    }
}

//----------------------------------------------   Orders  ----------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order_id: OrderId,
    pub order_number: String,
    pub order: Order,
}

impl From<Order> for CreatedOrder {
    fn from(order: Order) -> Self {
        Self { order_id: order.id, order_number: order.order_number.clone(), order }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
    pub total: usize,
}

impl From<Vec<Order>> for OrderList {
    fn from(orders: Vec<Order>) -> Self {
        Self { total: orders.len(), orders }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleOrder {
    pub order: Order,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: String,
}

//----------------------------------------------   Payments  ----------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOrderRequest {
    pub order_id: OrderId,
}

/// `POST /payments/confirm`. Everything except the order id is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub order_id: OrderId,
    #[serde(flatten)]
    pub confirmation: PaymentConfirmation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpiLink {
    pub upi_uri: String,
    pub vpa: String,
    pub payee_name: String,
    pub amount: Paise,
    pub note: String,
}

impl From<UpiPaymentRequest> for UpiLink {
    fn from(req: UpiPaymentRequest) -> Self {
        Self {
            upi_uri: req.upi_uri,
            vpa: req.vpa,
            payee_name: req.payee_name,
            amount: req.amount,
            note: req.note,
        }
    }
}

//----------------------------------------------   Notifications  ----------------------------------------------
/// Paging parameters for the notification feed.
///
/// Values are taken as strings so that junk like `?page=abc` falls back to the defaults instead of failing the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub user_id: Option<String>,
}

impl NotificationQuery {
    pub fn pagination(&self) -> Pagination {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        Pagination::new(parse(&self.page), parse(&self.limit))
    }

    pub fn requested_user(&self) -> Option<UserId> {
        self.user_id.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(UserId::from)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
    pub unread: i64,
}

impl NotificationFeed {
    pub fn new(page: NotificationPage, paging: Pagination) -> Self {
        Self {
            total_pages: paging.total_pages(page.total),
            notifications: page.notifications,
            page: paging.page(),
            page_size: paging.page_size(),
            total: page.total,
            unread: page.unread,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCount {
    pub unread: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleNotification {
    pub notification: Notification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkedRead {
    pub updated: u64,
}
