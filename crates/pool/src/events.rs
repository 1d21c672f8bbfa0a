//! Out-of-band event reporting.
//!
//! Background paths (the idle reaper above all) have no caller to hand a
//! fault to, so they report through an injected [`EventSink`]. The pool
//! ships two sinks: [`TracingSink`] (the default) and the broadcast-backed
//! [`EventBus`].

use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::Error;

// ---------------------------------------------------------------------------
// PoolEvent
// ---------------------------------------------------------------------------

/// Events emitted by the pool and its built-in operators.
#[derive(Debug, Clone)]
pub enum PoolEvent {
    /// A fault that could not be returned to any caller.
    Error {
        /// The fault itself.
        error: Arc<Error>,
    },
    /// A connection was created and installed into the pool.
    ConnectionCreated {
        /// The new resource.
        resource_id: Uuid,
    },
    /// A connection was torn down and removed from every registry.
    ConnectionDestroyed {
        /// The removed resource.
        resource_id: Uuid,
    },
}

/// Discriminant of a [`PoolEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum EventType {
    Error,
    ConnectionCreated,
    ConnectionDestroyed,
}

impl PoolEvent {
    /// Build an error event from a fault.
    #[must_use]
    pub fn error(error: Error) -> Self {
        Self::Error {
            error: Arc::new(error),
        }
    }

    /// The kind of this event.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Error { .. } => EventType::Error,
            Self::ConnectionCreated { .. } => EventType::ConnectionCreated,
            Self::ConnectionDestroyed { .. } => EventType::ConnectionDestroyed,
        }
    }
}

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// Receiver of out-of-band pool events. Emission never fails.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PoolEvent);
}

/// Default sink: forwards every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PoolEvent) {
        match event {
            PoolEvent::Error { error } => {
                tracing::error!(error = %error, "pool background task failed");
            }
            PoolEvent::ConnectionCreated { resource_id } => {
                tracing::debug!(%resource_id, "connection created");
            }
            PoolEvent::ConnectionDestroyed { resource_id } => {
                tracing::debug!(%resource_id, "connection destroyed");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Broadcast-based event sink.
///
/// Emission is fire-and-forget: with no subscribers, or a full channel,
/// events are dropped and lagging subscribers skip ahead.
pub struct EventBus {
    sender: broadcast::Sender<PoolEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `buffer_size` events per subscriber.
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self { sender }
    }

    /// Subscribe to every event emitted after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.sender.subscribe()
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: PoolEvent) {
        // No receivers is not an error.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.sender.receiver_count())
            .finish()
    }
}
