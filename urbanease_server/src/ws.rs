//! The realtime WebSocket endpoint.
//!
//! A client connects to `/ws` and then joins the room of its own user id by sending
//! `{"event": "join", "data": {"userId": "...", "token": "..."}}`. From then on, everything the engine publishes to
//! that user is pushed down the socket as `{"event": ..., "data": ...}` frames. The legacy form, where `data` is just
//! the user id, is still understood, but is only accepted when token checks are switched off.
//!
//! The server pings every 5s and drops the connection after 10s without any client traffic. Room membership dies
//! with the connection.
use std::time::{Duration, Instant};

use actix_web::{get, web, HttpRequest, HttpResponse};
use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use log::*;
use serde::Deserialize;
use serde_json::Value;
use tokio::{sync::mpsc, time};
use urbanease_engine::{
    db_types::UserId,
    realtime::{ConnectionId, ConnectionRegistry, RealtimeMessage, JOIN_EVENT, LEAVE_EVENT},
};

use crate::{
    auth::{bearer_token, TokenValidator},
    config::ServerOptions,
};

#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

#[get("/ws")]
pub async fn ws_index(
    req: HttpRequest,
    body: web::Payload,
    registry: web::Data<ConnectionRegistry>,
    validator: web::Data<TokenValidator>,
    options: web::Data<ServerOptions>,
) -> actix_web::Result<HttpResponse> {
    let (response, session, stream) = actix_ws::handle(&req, body)?;
    let mut ws = WsSession::new(registry.get_ref().clone(), validator.get_ref().clone(), options.ws_require_token);
    // Browsers cannot set headers on a WebSocket upgrade, but other clients can, and may skip the token in the join.
    ws.upgrade_token = bearer_token(req.headers()).ok().map(String::from);
    debug!("🔌️ New WebSocket connection {} from {:?}", ws.id, req.peer_addr());
    actix_web::rt::spawn(ws.run(session, stream));
    Ok(response)
}

/// The `data` of a join or leave frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RoomRequest {
    Bare(String),
    Full {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(default)]
        token: Option<String>,
    },
}

impl RoomRequest {
    pub fn parse(data: &Value) -> Option<Self> {
        serde_json::from_value::<RoomRequest>(data.clone()).ok().filter(|r| !r.room().is_blank())
    }

    pub fn room(&self) -> UserId {
        match self {
            Self::Bare(id) => UserId::from(id.trim()),
            Self::Full { user_id, .. } => UserId::from(user_id.trim()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Bare(_) => None,
            Self::Full { token, .. } => token.as_deref(),
        }
    }
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    Network(Closed),
}

pub struct WsSession {
    id: ConnectionId,
    registry: ConnectionRegistry,
    validator: TokenValidator,
    require_token: bool,
    upgrade_token: Option<String>,
    sender: mpsc::UnboundedSender<RealtimeMessage>,
    outbox: Option<mpsc::UnboundedReceiver<RealtimeMessage>>,
}

impl WsSession {
    pub fn new(registry: ConnectionRegistry, validator: TokenValidator, require_token: bool) -> Self {
        let (sender, outbox) = mpsc::unbounded_channel();
        let id = registry.next_connection_id();
        Self { id, registry, validator, require_token, upgrade_token: None, sender, outbox: Some(outbox) }
    }

    async fn run(mut self, mut session: Session, mut stream: MessageStream) {
        let Some(mut outbox) = self.outbox.take() else {
            return;
        };
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);
        let error = loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => Self::on_heartbeat(&mut session, last_heartbeat).await,
                message = stream.recv() => self.on_message(&mut session, &mut last_heartbeat, message).await,
                Some(outgoing) = outbox.recv() => Self::send(&mut session, &outgoing).await.map_err(SessionError::Network),
            };
            if let Err(e) = result {
                break e;
            }
        };
        self.registry.leave_all(self.id).await;
        self.log_shutdown_reason(&error);
        if let Some(reason) = close_reason_for(error) {
            if let Err(e) = session.close(reason).await {
                debug!("🔌️ Could not close {} cleanly. {e}", self.id);
            }
        }
    }

    async fn on_heartbeat(session: &mut Session, last_heartbeat: Instant) -> Result<(), SessionError> {
        if Instant::now().duration_since(last_heartbeat) > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }
        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn on_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let message = match message {
            None => return Err(SessionError::StreamClosed),
            Some(Err(e)) => return Err(SessionError::Protocol(e)),
            Some(Ok(m)) => m,
        };
        *last_heartbeat = Instant::now();
        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(SessionError::Network),
            Message::Text(text) => {
                let reply = self.on_frame(text.as_ref()).await;
                match reply {
                    Some(reply) => Self::send(session, &reply).await.map_err(SessionError::Network),
                    None => Ok(()),
                }
            },
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => Ok(()),
        }
    }

    /// Handles a client frame, returning the acknowledgement to send back, if any.
    async fn on_frame(&self, text: &str) -> Option<RealtimeMessage> {
        let frame = match serde_json::from_str::<RealtimeMessage>(text) {
            Ok(frame) => frame,
            Err(e) => {
                debug!("🔌️ {} sent a malformed frame. {e}", self.id);
                return Some(RealtimeMessage::error("Malformed frame"));
            },
        };
        match frame.event.as_str() {
            JOIN_EVENT => Some(self.join(&frame.data).await),
            LEAVE_EVENT => {
                if let Some(req) = RoomRequest::parse(&frame.data) {
                    self.registry.leave(&req.room(), self.id).await;
                }
                None
            },
            other => {
                trace!("🔌️ Ignoring '{other}' frame from {}", self.id);
                None
            },
        }
    }

    async fn join(&self, data: &Value) -> RealtimeMessage {
        let Some(req) = RoomRequest::parse(data) else {
            return RealtimeMessage::error("A user id is required to join a room");
        };
        let room = req.room();
        if let Err(reason) = self.authorize_join(&room, req.token()) {
            info!("🔌️ {} was refused entry to room {room}. {reason}", self.id);
            return RealtimeMessage::error(reason);
        }
        self.registry.join(&room, self.id, self.sender.clone()).await;
        RealtimeMessage::joined(room.as_str())
    }

    /// A connection may only join the room of the user its token was issued to.
    pub fn authorize_join(&self, room: &UserId, token: Option<&str>) -> Result<(), String> {
        if !self.require_token {
            return Ok(());
        }
        let token = token
            .or(self.upgrade_token.as_deref())
            .ok_or_else(|| "A valid token is required to join a room".to_string())?;
        let claims = self.validator.validate(token).map_err(|e| e.to_string())?;
        if &claims.id == room {
            Ok(())
        } else {
            Err("You may only join your own room".to_string())
        }
    }

    async fn send(session: &mut Session, message: &RealtimeMessage) -> Result<(), Closed> {
        match serde_json::to_string(message) {
            Ok(body) => session.text(body).await,
            Err(e) => {
                warn!("🔌️ Could not serialize '{}' frame. {e}", message.event);
                Ok(())
            },
        }
    }

    fn log_shutdown_reason(&self, error: &SessionError) {
        match error {
            SessionError::HeartbeatTimeout => debug!("🔌️ {} timed out", self.id),
            SessionError::Protocol(e) => warn!("🔌️ WebSocket protocol error on {}. {e}", self.id),
            SessionError::Network(e) => debug!("🔌️ Could not write to {}. {e}", self.id),
            SessionError::ClientClosed(_) | SessionError::StreamClosed => debug!("🔌️ {} disconnected", self.id),
        }
    }
}

fn close_reason_for(error: SessionError) -> Option<Option<CloseReason>> {
    match error {
        SessionError::HeartbeatTimeout => {
            Some(Some(CloseReason { code: CloseCode::Normal, description: Some("heartbeat timeout".to_owned()) }))
        },
        SessionError::Protocol(_) => {
            Some(Some(CloseReason { code: CloseCode::Protocol, description: Some("protocol error".to_owned()) }))
        },
        SessionError::ClientClosed(reason) => Some(reason),
        SessionError::StreamClosed | SessionError::Network(_) => None,
    }
}
