//! The lifecycle audit trail.
//!
//! Every order creation, status change and payment update is written to the `ue::audit` log target, so that it can
//! be routed to its own sink (e.g. `RUST_LOG=ue::audit=info`).
use futures::FutureExt;
use log::*;
use urbanease_engine::events::{EventHooks, OrderCreatedEvent, OrderStatusChangedEvent, PaymentUpdatedEvent};

pub const AUDIT_TARGET: &str = "ue::audit";

pub fn audit_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_created(|ev| {
            info!(target: AUDIT_TARGET, "{}", order_created_entry(&ev));
            async {}.boxed()
        })
        .on_status_changed(|ev| {
            info!(target: AUDIT_TARGET, "{}", status_changed_entry(&ev));
            async {}.boxed()
        })
        .on_payment_updated(|ev| {
            info!(target: AUDIT_TARGET, "{}", payment_updated_entry(&ev));
            async {}.boxed()
        });
    hooks
}

fn order_created_entry(ev: &OrderCreatedEvent) -> String {
    let order = &ev.order;
    format!(
        "📋️ order={} number={} owner={} total={} items={} method={}",
        order.id,
        order.order_number,
        order.owner_id,
        order.total,
        order.products.len(),
        order.payment_method
    )
}

fn status_changed_entry(ev: &OrderStatusChangedEvent) -> String {
    format!("📋️ order={} owner={} status={}", ev.order.id, ev.order.owner_id, ev.new_status)
}

fn payment_updated_entry(ev: &PaymentUpdatedEvent) -> String {
    let payment = match &ev.payment {
        Some(p) => format!("method={} payment={}", p.method, p.status),
        None => "payment=none".to_string(),
    };
    format!("📋️ order={} owner={} {payment} status={}", ev.order.id, ev.order.owner_id, ev.order.status)
}
