//! UrbanEase order engine
//!
//! This library holds the order lifecycle core of the UrbanEase storefront. It has no knowledge of HTTP; the
//! `urbanease_server` crate exposes it over a JSON API and a WebSocket endpoint.
//!
//! The library is divided into these sections:
//! 1. Storage ([`mod@db`]). The [`OrderManagement`] and [`NotificationManagement`] traits describe the durable order
//!    and notification records and the atomic mutations on them. SQLite is the bundled backend. The record types live
//!    in [`mod@db_types`].
//! 2. The public API ([`mod@ue_api`]). [`OrderFlowApi`] handles checkout and the privileged status state machine,
//!    [`PaymentApi`] the customer payment state machine, and [`OrderQueryApi`] and [`NotificationApi`] the
//!    authorization-aware reads.
//! 3. Realtime delivery ([`mod@realtime`]). A room per user, to which order status changes and new notifications are
//!    pushed on a best-effort basis.
//!
//! Lifecycle events (order created, status changed, payment updated) can also be observed in-process by registering
//! hooks with [`events::EventHooks`].
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod realtime;
pub mod ue_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, DEFAULT_DATABASE_URL};
pub use db::traits::{NotificationManagement, OrderManagement, OrderStore, StoreError};
pub use ue_api::{
    errors::OrderFlowError,
    notification_api::NotificationApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    order_query_api::OrderQueryApi,
    payment_api::PaymentApi,
};
