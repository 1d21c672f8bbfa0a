//! Typed commands routed to operators.

use std::sync::Arc;

use crate::resource::{Placeholder, Resource};

/// Closed set of task kinds the pool dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// Bring the pool up to its minimum size.
    InitializePool,
    /// Periodic scan for idle connections past their timeout.
    CheckIdleTimeout,
    /// Pending requests may be serviceable.
    Acquire,
    /// A caller handed a connection back.
    Return,
    /// A connection must be torn down.
    Destroy,
    /// Create a connection into a reserved slot.
    Create,
    /// A live resource just landed in the all-resources registry.
    Register,
}

impl TaskType {
    /// Upper-snake name used in logs and fault messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InitializePool => "INITIALIZE_POOL",
            Self::CheckIdleTimeout => "CHECK_IDLE_TIMEOUT",
            Self::Acquire => "ACQUIRE",
            Self::Return => "RETURN",
            Self::Destroy => "DESTROY",
            Self::Create => "CREATE",
            Self::Register => "REGISTER",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task-specific data.
pub enum TaskPayload<C> {
    /// Nothing attached.
    Empty,
    /// The reservation a `CREATE` should fill.
    Placeholder(Placeholder),
    /// The resource a `REGISTER` announces.
    Resource(Arc<Resource<C>>),
    /// The connection a `RETURN` or `DESTROY` concerns.
    Connection(Arc<C>),
}

/// Immutable `{task_type, payload}` command.
pub struct Task<C> {
    task_type: TaskType,
    payload: TaskPayload<C>,
}

impl<C> Task<C> {
    /// Build a task from its parts.
    pub fn new(task_type: TaskType, payload: TaskPayload<C>) -> Self {
        Self { task_type, payload }
    }

    #[must_use]
    pub fn initialize_pool() -> Self {
        Self::new(TaskType::InitializePool, TaskPayload::Empty)
    }

    #[must_use]
    pub fn check_idle_timeout() -> Self {
        Self::new(TaskType::CheckIdleTimeout, TaskPayload::Empty)
    }

    #[must_use]
    pub fn acquire() -> Self {
        Self::new(TaskType::Acquire, TaskPayload::Empty)
    }

    pub fn return_connection(connection: Arc<C>) -> Self {
        Self::new(TaskType::Return, TaskPayload::Connection(connection))
    }

    pub fn destroy(connection: Arc<C>) -> Self {
        Self::new(TaskType::Destroy, TaskPayload::Connection(connection))
    }

    #[must_use]
    pub fn create(placeholder: Placeholder) -> Self {
        Self::new(TaskType::Create, TaskPayload::Placeholder(placeholder))
    }

    pub fn register(resource: Arc<Resource<C>>) -> Self {
        Self::new(TaskType::Register, TaskPayload::Resource(resource))
    }

    /// The task kind.
    #[must_use]
    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    /// The attached payload.
    #[must_use]
    pub fn payload(&self) -> &TaskPayload<C> {
        &self.payload
    }

    /// The connection payload, if any.
    #[must_use]
    pub fn connection(&self) -> Option<&Arc<C>> {
        match &self.payload {
            TaskPayload::Connection(connection) => Some(connection),
            _ => None,
        }
    }

    /// The resource payload, if any.
    #[must_use]
    pub fn resource(&self) -> Option<&Arc<Resource<C>>> {
        match &self.payload {
            TaskPayload::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    /// The placeholder payload, if any.
    #[must_use]
    pub fn placeholder(&self) -> Option<Placeholder> {
        match &self.payload {
            TaskPayload::Placeholder(placeholder) => Some(*placeholder),
            _ => None,
        }
    }
}

impl<C> std::fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let payload = match &self.payload {
            TaskPayload::Empty => "empty".to_string(),
            TaskPayload::Placeholder(p) => p.to_string(),
            TaskPayload::Resource(r) => format!("resource {}", r.id()),
            TaskPayload::Connection(_) => "connection".to_string(),
        };
        f.debug_struct("Task")
            .field("task_type", &self.task_type)
            .field("payload", &payload)
            .finish()
    }
}
