use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::OrderManagement,
    db_types::{Order, OrderId, Role, UserId},
    ue_api::errors::OrderFlowError,
};

/// Read-only, authorization-aware access to orders.
pub struct OrderQueryApi<B> {
    db: B,
}

impl<B> Debug for OrderQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderQueryApi")
    }
}

impl<B> OrderQueryApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches a single order on behalf of `caller`.
    ///
    /// Admins and moderators can see any order. Everyone else only sees their own, and gets `NotFound` for anyone
    /// else's, so that order ids cannot be enumerated.
    pub async fn order_for(&self, order_id: OrderId, caller: &UserId, role: Role) -> Result<Order, OrderFlowError> {
        let order = if role.is_privileged() {
            self.db.fetch_order(order_id).await?
        } else {
            self.db.fetch_order_for_owner(order_id, caller).await?
        };
        order.ok_or_else(|| {
            trace!("💻️ Order {order_id} is not visible to {caller}");
            OrderFlowError::order_not_found()
        })
    }

    /// The caller's own orders, newest first.
    pub async fn orders_for_user(&self, user: &UserId) -> Result<Vec<Order>, OrderFlowError> {
        Ok(self.db.fetch_orders_for_user(user).await?)
    }

    /// Every order in the system, newest first. Admins and moderators only.
    pub async fn all_orders(&self, role: Role) -> Result<Vec<Order>, OrderFlowError> {
        if !role.is_privileged() {
            return Err(OrderFlowError::AuthorizationError("Insufficient permissions".into()));
        }
        Ok(self.db.fetch_all_orders().await?)
    }
}
