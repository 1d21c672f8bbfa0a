//! Request fulfillment operator.

use std::sync::Arc;

use async_trait::async_trait;

use super::connection::create_all;
use super::{Operator, Outcome};
use crate::error::Result;
use crate::manager::Manager;
use crate::pool::Pool;
use crate::resource::Placeholder;
use crate::task::{Task, TaskType};

/// Claims `ACQUIRE`: pairs pending requests with idle resources in FIFO
/// order, then reserves capacity for whatever is still waiting.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOperator;

impl RequestOperator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<M: Manager> Operator<M> for RequestOperator {
    fn name(&self) -> &str {
        "request"
    }

    async fn attempt(&self, pool: &Pool<M>, task: &Task<M::Connection>) -> Result<Option<Outcome>> {
        if task.task_type() != TaskType::Acquire {
            return Ok(None);
        }
        serve(pool).await.map(Some)
    }
}

async fn serve<M: Manager>(pool: &Pool<M>) -> Result<Outcome> {
    pool.remove_non_pending_request();

    let mut fulfilled = 0;
    while let Some((request, resource)) = pool.take_next_match() {
        match request.fulfill(Arc::clone(resource.connection())) {
            Ok(()) => {
                fulfilled += 1;
                tracing::debug!(
                    request_id = %request.id(),
                    resource_id = %resource.id(),
                    "request fulfilled"
                );
            }
            Err(_) => {
                tracing::debug!(request_id = %request.id(), "requester gone, requeueing resource");
                pool.requeue_front(resource);
            }
        }
    }

    // Placeholders already in flight will each serve one waiting request.
    let shortfall = pool
        .pending_request_num()
        .saturating_sub(pool.placeholder_num());
    let placeholders: Vec<Placeholder> = (0..shortfall)
        .map_while(|_| pool.reserve_placeholder())
        .collect();
    let creating = placeholders.len();
    if creating > 0 {
        tracing::debug!(creating, "creating connections for waiting requests");
        create_all(pool, placeholders).await?;
    }

    Ok(Outcome::Served {
        fulfilled,
        creating,
    })
}
