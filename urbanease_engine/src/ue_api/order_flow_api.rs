use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::{NotificationManagement, OrderManagement},
    db_types::{Order, OrderId, OrderStatus, Role, UserId},
    events::{EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    realtime::RealtimePublisher,
    ue_api::{
        errors::OrderFlowError,
        fanout::{notify_owner, OwnerNotice},
        order_objects::{NewOrderRequest, StatusPolicy},
    },
};

/// `OrderFlowApi` handles checkout and the privileged order status state machine.
///
/// Status changes are written first. The owner's notification and realtime pushes follow as best-effort side effects.
pub struct OrderFlowApi<B, P> {
    db: B,
    publisher: P,
    producers: EventProducers,
    policy: StatusPolicy,
    verify_totals: bool,
}

impl<B, P> Debug for OrderFlowApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?}, verify totals: {})", self.policy, self.verify_totals)
    }
}

impl<B, P> OrderFlowApi<B, P> {
    pub fn new(db: B, publisher: P, producers: EventProducers) -> Self {
        Self { db, publisher, producers, policy: StatusPolicy::default(), verify_totals: true }
    }

    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// When enabled (the default), checkout totals must agree with the line items.
    pub fn with_total_verification(mut self, verify: bool) -> Self {
        self.verify_totals = verify;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, P> OrderFlowApi<B, P>
where
    B: OrderManagement + NotificationManagement,
    P: RealtimePublisher,
{
    /// Places a new order for `owner`. The order starts out `pending`, with a pending payment record.
    pub async fn create_order(&self, owner: &UserId, request: NewOrderRequest) -> Result<Order, OrderFlowError> {
        if owner.is_blank() {
            return Err(OrderFlowError::ValidationError("Order owner is required".into()));
        }
        request.validate(self.verify_totals)?;
        let order = self.db.insert_order(request.into_new_order(owner.clone())).await?;
        info!("🔄️📦️ Order {} ({}) placed by {owner} for {}", order.id, order.order_number, order.total);
        self.producers.order_created(OrderCreatedEvent::new(order.clone())).await;
        Ok(order)
    }

    /// Moves an order to a new status. Only admins and moderators may do this.
    ///
    /// `status` is the raw value supplied by the caller. Anything outside the six known statuses is rejected and the
    /// order is left untouched.
    pub async fn set_status(&self, order_id: OrderId, status: &str, role: Role) -> Result<Order, OrderFlowError> {
        if !role.is_privileged() {
            warn!("🔄️🚦️ A caller with role {role} tried to change the status of order {order_id}");
            return Err(OrderFlowError::AuthorizationError("Insufficient permissions".into()));
        }
        let status = status.parse::<OrderStatus>().map_err(|e| {
            debug!("🔄️🚦️ Rejected status update for order {order_id}. {e}");
            OrderFlowError::ValidationError("Invalid status".into())
        })?;
        let guard = self.policy.guard_for(status);
        let order = match self.db.update_order_status(order_id, status, guard).await? {
            Some(order) => order,
            None => return Err(self.explain_rejected_update(order_id, status).await),
        };
        info!("🔄️🚦️ Order {order_id} is now {status}");
        notify_owner(&self.db, &self.publisher, &order, OwnerNotice::status_updated(&order)).await;
        self.producers.status_changed(OrderStatusChangedEvent::new(order.clone())).await;
        Ok(order)
    }

    // The conditional update touched nothing: either the order is missing or the policy refused the transition.
    async fn explain_rejected_update(&self, order_id: OrderId, status: OrderStatus) -> OrderFlowError {
        match self.db.fetch_order(order_id).await {
            Ok(Some(order)) => {
                debug!("🔄️🚦️ Order {order_id} cannot move from {} to {status}", order.status);
                OrderFlowError::ValidationError("Invalid status transition".into())
            },
            Ok(None) => OrderFlowError::order_not_found(),
            Err(e) => e.into(),
        }
    }
}
