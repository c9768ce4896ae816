use std::{
    collections::HashMap,
    fmt::Display,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use log::*;
use tokio::sync::{mpsc, RwLock};

use crate::{
    db_types::UserId,
    realtime::{RealtimeError, RealtimeMessage, RealtimePublisher},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

type Room = HashMap<ConnectionId, mpsc::UnboundedSender<RealtimeMessage>>;

/// Tracks which live connections have joined which user rooms.
///
/// The registry is cheap to clone; all clones share the same rooms, so a single registry can be handed to every
/// server worker.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    rooms: Arc<RwLock<HashMap<UserId, Room>>>,
    next_id: Arc<AtomicU64>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an id for a new connection. The connection is not in any room until it [`join`](Self::join)s one.
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Adds the connection to the room of `user`. Joining the same room twice is harmless.
    pub async fn join(&self, user: &UserId, id: ConnectionId, sender: mpsc::UnboundedSender<RealtimeMessage>) {
        let mut rooms = self.rooms.write().await;
        rooms.entry(user.clone()).or_default().insert(id, sender);
        debug!("🔌️ {id} joined room {user}");
    }

    pub async fn leave(&self, user: &UserId, id: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get_mut(user) {
            room.remove(&id);
            if room.is_empty() {
                rooms.remove(user);
            }
        }
        debug!("🔌️ {id} left room {user}");
    }

    /// Removes the connection from every room. Call this when the connection closes.
    pub async fn leave_all(&self, id: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, room| {
            room.remove(&id);
            !room.is_empty()
        });
        trace!("🔌️ {id} removed from all rooms");
    }

    /// The number of live connections in the room of `user`.
    pub async fn room_size(&self, user: &UserId) -> usize {
        self.rooms.read().await.get(user).map(|r| r.len()).unwrap_or(0)
    }

    async fn prune(&self, user: &UserId, dead: &[ConnectionId]) {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get_mut(user) {
            dead.iter().for_each(|id| {
                room.remove(id);
            });
            if room.is_empty() {
                rooms.remove(user);
            }
        }
        debug!("🔌️ Pruned {} dead connections from room {user}", dead.len());
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConnectionRegistry ({} connections issued)", self.next_id.load(Ordering::Relaxed))
    }
}

impl RealtimePublisher for ConnectionRegistry {
    async fn publish_to_user(&self, user: &UserId, message: RealtimeMessage) -> Result<usize, RealtimeError> {
        let (delivered, dead) = {
            let rooms = self.rooms.read().await;
            let Some(room) = rooms.get(user) else {
                trace!("🔌️ Nobody is listening in room {user}. '{}' dropped", message.event);
                return Ok(0);
            };
            let mut delivered = 0;
            let mut dead = Vec::new();
            for (id, sender) in room {
                match sender.send(message.clone()) {
                    Ok(()) => delivered += 1,
                    Err(_) => dead.push(*id),
                }
            }
            (delivered, dead)
        };
        if !dead.is_empty() {
            self.prune(user, &dead).await;
        }
        trace!("🔌️ '{}' delivered to {delivered} connections in room {user}", message.event);
        Ok(delivered)
    }
}
