//! # Nebula Pool
//!
//! Operator-dispatched connection pool engine.
//!
//! The [`Pool`] keeps three registries (every resource and reservation,
//! the idle queue, the request queue) and never performs I/O itself: each
//! mutation dispatches a [`Task`] to the registered [`Operator`]s, and the
//! one that claims it does the real work through a [`Manager`]. Capacity is
//! reserved with [`Placeholder`]s before any asynchronous creation starts,
//! so concurrent acquisitions never over-commit.
//!
//! ```no_run
//! use async_trait::async_trait;
//! use nebula_pool::{Manager, Pool, PoolOptions, Result};
//!
//! struct Tcp;
//!
//! #[async_trait]
//! impl Manager for Tcp {
//!     type Parameters = String;
//!     type Connection = String;
//!
//!     async fn connect(&self, address: &String) -> Result<String> {
//!         Ok(format!("connected to {address}"))
//!     }
//! }
//!
//! # async fn run() -> Result<()> {
//! let pool = Pool::new(Tcp, "127.0.0.1:5432".to_string(), PoolOptions::default())?;
//! pool.initialize().await?;
//! let conn = pool.acquire().await?;
//! println!("{}", *conn);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod events;
pub mod guard;
pub mod manager;
pub mod operator;
pub mod pool;
mod reaper;
pub mod request;
pub mod resource;
pub mod task;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Error, Result};
pub use events::{EventBus, EventSink, EventType, PoolEvent, TracingSink};
pub use guard::PooledConnection;
pub use manager::Manager;
pub use operator::{ConnectionOperator, Operator, Outcome, RequestOperator};
pub use pool::{Pool, PoolBuilder, PoolOptions, RawPoolOptions};
pub use request::{Request, RequestState};
pub use resource::{Placeholder, Resource, ResourceState, Slot};
pub use task::{Task, TaskPayload, TaskType};

/// Common imports for implementing managers and operators.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::events::{EventSink, PoolEvent};
    pub use crate::manager::Manager;
    pub use crate::operator::{Operator, Outcome};
    pub use crate::pool::{Pool, PoolOptions};
    pub use crate::resource::{Placeholder, Resource, Slot};
    pub use crate::task::{Task, TaskPayload, TaskType};
    pub use async_trait::async_trait;
}
