use std::{fmt::Debug, time::Duration};

use log::*;

use crate::{
    db::traits::{NotificationManagement, OrderManagement},
    db_types::{Order, OrderId, PaymentConfirmation, UserId},
    events::{EventProducers, PaymentUpdatedEvent},
    helpers::{upi_pay_uri, UpiPayee},
    realtime::RealtimePublisher,
    ue_api::{
        errors::OrderFlowError,
        fanout::{notify_owner, OwnerNotice},
        order_objects::UpiPaymentRequest,
    },
};

pub const DEFAULT_PAYMENT_TIMEOUT: Duration = Duration::from_millis(5_000);

/// The customer side of the payment state machine. Every method is scoped to the order's owner; other users' orders
/// are reported as not found.
pub struct PaymentApi<B, P> {
    db: B,
    publisher: P,
    producers: EventProducers,
    payee: UpiPayee,
    timeout: Duration,
}

impl<B, P> Debug for PaymentApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi (payee: {})", self.payee.vpa)
    }
}

impl<B, P> PaymentApi<B, P> {
    pub fn new(db: B, publisher: P, producers: EventProducers) -> Self {
        Self { db, publisher, producers, payee: UpiPayee::default(), timeout: DEFAULT_PAYMENT_TIMEOUT }
    }

    pub fn with_payee(mut self, payee: UpiPayee) -> Self {
        self.payee = payee;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn payee(&self) -> &UpiPayee {
        &self.payee
    }
}

impl<B, P> PaymentApi<B, P>
where
    B: OrderManagement + NotificationManagement,
    P: RealtimePublisher,
{
    /// Prepares a UPI deep link for the order, attaching a pending UPI payment record if the order has none.
    ///
    /// Safe to call repeatedly. The gateway round trip is bounded by the configured timeout; a timed-out call leaves
    /// the order either untouched or with its single pending record, so the client can simply retry.
    pub async fn initiate_payment(&self, order_id: OrderId, owner: &UserId) -> Result<UpiPaymentRequest, OrderFlowError> {
        let order = tokio::time::timeout(self.timeout, self.db.initiate_payment(order_id, owner))
            .await
            .map_err(|_| {
                warn!("🔄️💳️ Payment initiation for order {order_id} timed out after {:?}", self.timeout);
                OrderFlowError::DependencyError("The payment gateway timed out. Please try again.".into())
            })??
            .ok_or_else(OrderFlowError::order_not_found)?;
        let note = format!("Order {}", order.order_number);
        let upi_uri = upi_pay_uri(&self.payee, order.total, &note);
        debug!("🔄️💳️ UPI payment link prepared for order {order_id}");
        Ok(UpiPaymentRequest {
            order_id: order.id,
            upi_uri,
            vpa: self.payee.vpa.clone(),
            payee_name: self.payee.name.clone(),
            amount: order.total,
            note,
            payment: order.payment,
        })
    }

    /// Records a successful payment. The order moves to processing in the same update.
    pub async fn confirm_payment(
        &self,
        order_id: OrderId,
        owner: &UserId,
        confirmation: PaymentConfirmation,
    ) -> Result<Order, OrderFlowError> {
        let method = confirmation.method;
        let order =
            self.db.confirm_payment(order_id, owner, confirmation).await?.ok_or_else(OrderFlowError::order_not_found)?;
        info!("🔄️💳️ Payment for order {order_id} confirmed via {method}. Order is {}", order.status);
        self.after_payment_change(&order, OwnerNotice::payment_received(&order)).await;
        Ok(order)
    }

    /// Switches the order to cash on delivery. The order moves to processing in the same update.
    pub async fn select_cod(&self, order_id: OrderId, owner: &UserId) -> Result<Order, OrderFlowError> {
        let order = self.db.select_cod(order_id, owner).await?.ok_or_else(OrderFlowError::order_not_found)?;
        info!("🔄️💳️ Cash on delivery selected for order {order_id}. Order is {}", order.status);
        self.after_payment_change(&order, OwnerNotice::cod_selected(&order)).await;
        Ok(order)
    }

    /// Marks the payment as failed. The order status does not change.
    pub async fn decline_payment(&self, order_id: OrderId, owner: &UserId) -> Result<Order, OrderFlowError> {
        let order = self.db.decline_payment(order_id, owner).await?.ok_or_else(OrderFlowError::order_not_found)?;
        info!("🔄️💳️ Payment for order {order_id} was declined");
        self.after_payment_change(&order, OwnerNotice::payment_declined(&order)).await;
        Ok(order)
    }

    async fn after_payment_change(&self, order: &Order, notice: OwnerNotice) {
        notify_owner(&self.db, &self.publisher, order, notice).await;
        self.producers.payment_updated(PaymentUpdatedEvent::new(order.clone())).await;
    }
}
