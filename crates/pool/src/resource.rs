//! Pool entries: resources wrapping live connections, and placeholders
//! reserving capacity while a connection is still being created.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

static NEXT_PLACEHOLDER: AtomicU64 = AtomicU64::new(1);

/// Inert token occupying one capacity slot during asynchronous creation.
///
/// Every placeholder is unique; two tokens compare equal only if one is a
/// copy of the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placeholder(u64);

impl Placeholder {
    /// Mint a fresh, unique placeholder.
    #[must_use]
    pub fn new() -> Self {
        Self(NEXT_PLACEHOLDER.fetch_add(1, Ordering::Relaxed))
    }

    /// Numeric identity of this token.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Default for Placeholder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Placeholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "placeholder#{}", self.0)
    }
}

/// Lifecycle state of a pooled resource.
///
/// Destruction is not a state: a destroyed resource is simply gone from
/// every registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceState {
    /// Sitting in the available queue, ready to be handed out.
    Idle,
    /// Handed to a caller.
    Allocated,
}

struct ResourceInner {
    state: ResourceState,
    last_idle_at: Instant,
}

/// One externally created connection plus its pool bookkeeping.
///
/// Resources are shared as `Arc<Resource<C>>` and compared by identity.
pub struct Resource<C> {
    id: Uuid,
    connection: Arc<C>,
    inner: Mutex<ResourceInner>,
}

impl<C> Resource<C> {
    /// Wrap a freshly created connection. New resources start idle.
    pub fn new(connection: C) -> Self {
        Self::from_shared(Arc::new(connection))
    }

    /// Wrap a connection that is already shared.
    pub fn from_shared(connection: Arc<C>) -> Self {
        Self {
            id: Uuid::new_v4(),
            connection,
            inner: Mutex::new(ResourceInner {
                state: ResourceState::Idle,
                last_idle_at: Instant::now(),
            }),
        }
    }

    /// Unique identifier, used in logs and events.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The wrapped connection handle.
    #[must_use]
    pub fn connection(&self) -> &Arc<C> {
        &self.connection
    }

    /// Whether this resource wraps exactly `connection` (pointer identity).
    #[must_use]
    pub fn owns(&self, connection: &Arc<C>) -> bool {
        Arc::ptr_eq(&self.connection, connection)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ResourceState {
        self.inner.lock().state
    }

    /// When the resource last entered the idle state.
    #[must_use]
    pub fn last_idle_at(&self) -> Instant {
        self.inner.lock().last_idle_at
    }

    /// How long the resource has been idle. Zero while allocated.
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        let inner = self.inner.lock();
        match inner.state {
            ResourceState::Idle => inner.last_idle_at.elapsed(),
            ResourceState::Allocated => Duration::ZERO,
        }
    }

    /// Enter the idle state and restart the idle clock.
    pub fn mark_idle(&self) {
        let mut inner = self.inner.lock();
        inner.state = ResourceState::Idle;
        inner.last_idle_at = Instant::now();
    }

    /// Enter the allocated state.
    pub fn mark_allocated(&self) {
        self.inner.lock().state = ResourceState::Allocated;
    }
}

impl<C> std::fmt::Debug for Resource<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

/// An entry of the all-resources registry.
pub enum Slot<C> {
    /// Capacity reserved for a connection still being created.
    Placeholder(Placeholder),
    /// A live resource.
    Resource(Arc<Resource<C>>),
}

impl<C> Slot<C> {
    /// Whether this slot is a reservation.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    /// Whether this slot is exactly `placeholder`.
    #[must_use]
    pub fn is(&self, placeholder: Placeholder) -> bool {
        matches!(self, Self::Placeholder(p) if *p == placeholder)
    }

    /// The resource in this slot, if any.
    #[must_use]
    pub fn as_resource(&self) -> Option<&Arc<Resource<C>>> {
        match self {
            Self::Resource(resource) => Some(resource),
            Self::Placeholder(_) => None,
        }
    }
}

impl<C> Clone for Slot<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Placeholder(p) => Self::Placeholder(*p),
            Self::Resource(r) => Self::Resource(Arc::clone(r)),
        }
    }
}

impl<C> std::fmt::Debug for Slot<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Placeholder(p) => f.debug_tuple("Placeholder").field(p).finish(),
            Self::Resource(r) => f.debug_tuple("Resource").field(&r.id()).finish(),
        }
    }
}

impl<C> From<Placeholder> for Slot<C> {
    fn from(placeholder: Placeholder) -> Self {
        Self::Placeholder(placeholder)
    }
}

impl<C> From<Arc<Resource<C>>> for Slot<C> {
    fn from(resource: Arc<Resource<C>>) -> Self {
        Self::Resource(resource)
    }
}
