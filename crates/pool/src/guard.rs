//! RAII guard for acquired connections

use std::sync::Arc;

use crate::manager::Manager;
use crate::pool::Pool;

/// A connection handed out by [`Pool::acquire`].
///
/// Dropping the guard returns the connection through
/// [`Pool::return_connection`] on a spawned task. Use
/// [`detach`](Self::detach) to take the shared handle and return or destroy
/// it manually.
pub struct PooledConnection<M: Manager> {
    connection: Arc<M::Connection>,
    pool: Option<Pool<M>>,
}

impl<M: Manager> PooledConnection<M> {
    pub(crate) fn new(pool: Pool<M>, connection: Arc<M::Connection>) -> Self {
        Self {
            connection,
            pool: Some(pool),
        }
    }

    /// The shared connection handle.
    #[must_use]
    pub fn connection(&self) -> &Arc<M::Connection> {
        &self.connection
    }

    /// Take the connection out of the guard without returning it.
    #[must_use]
    pub fn detach(mut self) -> Arc<M::Connection> {
        self.pool = None;
        Arc::clone(&self.connection)
    }
}

impl<M: Manager> std::ops::Deref for PooledConnection<M> {
    type Target = M::Connection;

    fn deref(&self) -> &M::Connection {
        &self.connection
    }
}

impl<M: Manager> Drop for PooledConnection<M> {
    fn drop(&mut self) {
        let Some(pool) = self.pool.take() else {
            return;
        };
        let connection = Arc::clone(&self.connection);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(error) = pool.return_connection(connection).await {
                        tracing::warn!(%error, "failed to return connection on drop");
                    }
                });
            }
            Err(_) => {
                tracing::warn!("connection dropped outside a runtime, not returned to the pool");
            }
        }
    }
}

impl<M: Manager> std::fmt::Debug for PooledConnection<M>
where
    M::Connection: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("connection", &self.connection)
            .field("attached", &self.pool.is_some())
            .finish()
    }
}
