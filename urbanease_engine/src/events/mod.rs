//! In-process lifecycle hooks.
//!
//! Interested parties register async callbacks in [`EventHooks`]. Each registered hook gets its own bounded channel and
//! a background task that runs the hook for every event it receives. Publishers only ever see [`EventProducers`], so
//! a slow or failing hook never holds up the request that emitted the event.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
