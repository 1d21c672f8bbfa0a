//! Pending acquisitions.
//!
//! A [`Request`] is the pool-side half of one `acquire` call: it carries the
//! outcome state and the sender that completes the caller's wait.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Outcome state of a request. Only pending requests are eligible for
/// servicing; the other two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RequestState {
    /// Waiting for a connection.
    Pending,
    /// A connection was handed over.
    Fulfilled,
    /// Timed out, failed, or abandoned by the caller.
    Rejected,
}

/// Receiving half given to the caller of `acquire`.
pub type Response<C> = oneshot::Receiver<Result<Arc<C>>>;

struct RequestInner<C> {
    state: RequestState,
    responder: Option<oneshot::Sender<Result<Arc<C>>>>,
}

/// One queued acquisition.
pub struct Request<C> {
    id: Uuid,
    created_at: Instant,
    inner: Mutex<RequestInner<C>>,
}

impl<C> Request<C> {
    /// Create a pending request and the receiver its caller waits on.
    #[must_use]
    pub fn new() -> (Self, Response<C>) {
        let (tx, rx) = oneshot::channel();
        let request = Self {
            id: Uuid::new_v4(),
            created_at: Instant::now(),
            inner: Mutex::new(RequestInner {
                state: RequestState::Pending,
                responder: Some(tx),
            }),
        };
        (request, rx)
    }

    /// Unique identifier, used in logs.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the request was created.
    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RequestState {
        self.inner.lock().state
    }

    /// Whether the request is still waiting.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state() == RequestState::Pending
    }

    /// Hand `connection` to the waiting caller.
    ///
    /// Gives the connection back when the request is no longer pending or
    /// the caller stopped waiting; in the latter case the request becomes
    /// rejected.
    pub fn fulfill(&self, connection: Arc<C>) -> std::result::Result<(), Arc<C>> {
        let mut inner = self.inner.lock();
        if inner.state != RequestState::Pending {
            return Err(connection);
        }
        let Some(responder) = inner.responder.take() else {
            inner.state = RequestState::Rejected;
            return Err(connection);
        };
        if responder.send(Ok(Arc::clone(&connection))).is_ok() {
            inner.state = RequestState::Fulfilled;
            Ok(())
        } else {
            inner.state = RequestState::Rejected;
            Err(connection)
        }
    }

    /// Fail the request with `error`. Returns `false` if it was not pending.
    pub fn reject(&self, error: Error) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != RequestState::Pending {
            return false;
        }
        inner.state = RequestState::Rejected;
        if let Some(responder) = inner.responder.take() {
            let _ = responder.send(Err(error));
        }
        true
    }

    /// Mark the request rejected without notifying the caller, which is
    /// the one giving up. Returns `false` if it was not pending.
    pub fn abandon(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state != RequestState::Pending {
            return false;
        }
        inner.state = RequestState::Rejected;
        inner.responder = None;
        true
    }
}

impl<C> std::fmt::Debug for Request<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
