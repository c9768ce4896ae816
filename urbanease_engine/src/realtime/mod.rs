//! Room-per-user realtime fan-out.
//!
//! Every connected client may join the room of its own user id. Anything published to a user is pushed, best effort,
//! to each live connection in that room. Nothing is persisted or retried here; the notification feed is the durable
//! record.
mod messages;
mod registry;

pub use messages::{
    RealtimeMessage,
    ERROR_EVENT,
    JOINED_EVENT,
    JOIN_EVENT,
    LEAVE_EVENT,
    NOTIFICATION_EVENT,
    ORDER_STATUS_EVENT,
};
pub use registry::{ConnectionId, ConnectionRegistry};
use thiserror::Error;

use crate::db_types::UserId;

#[derive(Debug, Clone, Error)]
pub enum RealtimeError {
    #[error("The realtime channel is unavailable. {0}")]
    Unavailable(String),
}

/// Pushes events to everyone listening in a user's room.
#[allow(async_fn_in_trait)]
pub trait RealtimePublisher {
    /// Returns the number of connections the message was handed to. Zero is not an error: the user may simply be
    /// offline.
    async fn publish_to_user(&self, user: &UserId, message: RealtimeMessage) -> Result<usize, RealtimeError>;
}
