use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderCreatedEvent,
    OrderStatusChangedEvent,
    PaymentUpdatedEvent,
};

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The sending halves of all registered hooks. Cloned into each API object.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub status_changed_producer: Vec<EventProducer<OrderStatusChangedEvent>>,
    pub payment_updated_producer: Vec<EventProducer<PaymentUpdatedEvent>>,
}

impl EventProducers {
    pub async fn order_created(&self, event: OrderCreatedEvent) {
        for emitter in &self.order_created_producer {
            emitter.publish_event(event.clone());
        }
    }

    pub async fn status_changed(&self, event: OrderStatusChangedEvent) {
        for emitter in &self.status_changed_producer {
            emitter.publish_event(event.clone());
        }
    }

    pub async fn payment_updated(&self, event: PaymentUpdatedEvent) {
        for emitter in &self.payment_updated_producer {
            emitter.publish_event(event.clone());
        }
    }
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
    pub on_payment_updated: Option<EventHandler<PaymentUpdatedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_created = hooks.on_order_created.map(|f| EventHandler::new("order created", buffer_size, f));
        let on_status_changed =
            hooks.on_status_changed.map(|f| EventHandler::new("status changed", buffer_size, f));
        let on_payment_updated =
            hooks.on_payment_updated.map(|f| EventHandler::new("payment updated", buffer_size, f));
        Self { on_order_created, on_status_changed, on_payment_updated }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_status_changed {
            result.status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_updated {
            result.payment_updated_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a background task for each registered handler.
    pub fn start_handlers(self) {
        if let Some(handler) = self.on_order_created {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_status_changed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_payment_updated {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_status_changed: Option<Handler<OrderStatusChangedEvent>>,
    pub on_payment_updated: Option<Handler<PaymentUpdatedEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStatusChangedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_payment_updated<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentUpdatedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_payment_updated = Some(Arc::new(f));
        self
    }
}
