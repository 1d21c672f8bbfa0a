//! Operators: the handlers that perform a task's real side effect.
//!
//! The pool never opens, closes or hands out a connection by itself. Every
//! mutation ends in a dispatch of a [`Task`] to all registered operators;
//! each one either claims the task (`Ok(Some(outcome))`) or declines it
//! (`Ok(None)`).

mod connection;
mod request;

pub use connection::ConnectionOperator;
pub use request::RequestOperator;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::manager::Manager;
use crate::pool::Pool;
use crate::task::Task;

/// Result of a claimed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Claimed and handled; nothing further to report.
    Done,
    /// `INITIALIZE_POOL` created this many connections.
    Initialized {
        created: usize,
    },
    /// `CREATE` installed a new connection.
    Created {
        resource_id: Uuid,
    },
    /// `ACQUIRE` fulfilled requests and started creations for the rest.
    Served {
        fulfilled: usize,
        creating: usize,
    },
    /// `DESTROY` removed a pooled connection.
    Destroyed {
        resource_id: Uuid,
    },
    /// `CHECK_IDLE_TIMEOUT` destroyed this many idle connections.
    Reaped {
        destroyed: usize,
    },
}

/// Handler registered with a pool.
///
/// Returning `Ok(None)` means "not my task" and must never be expressed as
/// an error. Operators change registries only through the pool's own
/// mutators.
#[async_trait]
pub trait Operator<M: Manager>: Send + Sync {
    /// Name used in logs and operator faults.
    fn name(&self) -> &str;

    /// Try to service `task`.
    async fn attempt(&self, pool: &Pool<M>, task: &Task<M::Connection>) -> Result<Option<Outcome>>;
}
