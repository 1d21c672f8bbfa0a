//! Connection manager: the code that actually opens and closes connections.
//!
//! The pool core never calls a manager. It stores one, together with the
//! opaque connection parameters, so operators can reach both.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Factory, validator and destroyer for one kind of connection.
#[async_trait]
pub trait Manager: Send + Sync + 'static {
    /// Credentials and settings forwarded verbatim to [`connect`](Self::connect).
    type Parameters: Send + Sync + 'static;

    /// The pooled connection handle.
    type Connection: Send + Sync + 'static;

    /// Open a new connection.
    async fn connect(&self, parameters: &Self::Parameters) -> Result<Self::Connection>;

    /// Whether a returned connection may be handed out again.
    async fn is_valid(&self, _connection: &Self::Connection) -> bool {
        true
    }

    /// Close a connection removed from the pool.
    ///
    /// Other holders of the `Arc` may still be alive; the default simply
    /// drops the pool's handle.
    async fn disconnect(&self, connection: Arc<Self::Connection>) -> Result<()> {
        drop(connection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Manager for Echo {
        type Parameters = String;
        type Connection = String;

        async fn connect(&self, parameters: &String) -> Result<String> {
            Ok(format!("conn:{parameters}"))
        }
    }

    #[tokio::test]
    async fn defaults_accept_and_drop() {
        let manager = Echo;
        let conn = manager.connect(&"db".to_string()).await.unwrap();
        assert_eq!(conn, "conn:db");
        assert!(manager.is_valid(&conn).await);
        manager.disconnect(Arc::new(conn)).await.unwrap();
    }
}
