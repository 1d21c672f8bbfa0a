//! Connection lifecycle operator.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use super::{Operator, Outcome};
use crate::error::{Error, Result};
use crate::events::PoolEvent;
use crate::manager::Manager;
use crate::pool::Pool;
use crate::resource::{Placeholder, Resource, ResourceState, Slot};
use crate::task::{Task, TaskPayload, TaskType};

/// Claims `INITIALIZE_POOL`, `CREATE`, `REGISTER`, `RETURN`, `DESTROY` and
/// `CHECK_IDLE_TIMEOUT`, performing the manager calls each one implies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionOperator;

impl ConnectionOperator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<M: Manager> Operator<M> for ConnectionOperator {
    fn name(&self) -> &str {
        "connection"
    }

    async fn attempt(&self, pool: &Pool<M>, task: &Task<M::Connection>) -> Result<Option<Outcome>> {
        let outcome = match (task.task_type(), task.payload()) {
            (TaskType::InitializePool, _) => initialize(pool).await?,
            (TaskType::Create, TaskPayload::Placeholder(placeholder)) => {
                create(pool, *placeholder).await?
            }
            (TaskType::Register, TaskPayload::Resource(resource)) => {
                pool.add_resource_to_available(Arc::clone(resource)).await?;
                Outcome::Done
            }
            (TaskType::Return, TaskPayload::Connection(connection)) => {
                give_back(pool, connection).await?
            }
            (TaskType::Destroy, TaskPayload::Connection(connection)) => {
                destroy(pool, connection).await?
            }
            (TaskType::CheckIdleTimeout, _) => reap(pool).await?,
            _ => return Ok(None),
        };
        Ok(Some(outcome))
    }
}

/// Dispatch one `CREATE` per placeholder, concurrently. Returns how many
/// succeeded, or the first failure.
pub(super) async fn create_all<M: Manager>(
    pool: &Pool<M>,
    placeholders: Vec<Placeholder>,
) -> Result<usize> {
    let tasks: Vec<Task<M::Connection>> = placeholders.into_iter().map(Task::create).collect();
    let results = join_all(tasks.iter().map(|task| pool.notify_all_operators(Some(task)))).await;

    let mut created = 0;
    let mut first_error = None;
    for result in results {
        match result {
            Ok(_) => created += 1,
            Err(error) => {
                first_error.get_or_insert(error);
            }
        }
    }
    match first_error {
        Some(error) => Err(error),
        None => Ok(created),
    }
}

async fn initialize<M: Manager>(pool: &Pool<M>) -> Result<Outcome> {
    let wanted = pool.options().min.saturating_sub(pool.pool_size());
    let placeholders: Vec<Placeholder> = (0..wanted)
        .map_while(|_| pool.reserve_placeholder())
        .collect();
    tracing::debug!(count = placeholders.len(), "initializing pool");

    let created = create_all(pool, placeholders).await?;
    Ok(Outcome::Initialized { created })
}

async fn create<M: Manager>(pool: &Pool<M>, placeholder: Placeholder) -> Result<Outcome> {
    let connection = match pool.manager().connect(pool.parameters()).await {
        Ok(connection) => connection,
        Err(error) => {
            pool.remove_placeholder(placeholder);
            tracing::warn!(%placeholder, %error, "connection creation failed");
            return Err(error);
        }
    };

    let resource = Arc::new(Resource::new(connection));
    let resource_id = resource.id();
    let installed = pool
        .replace_placeholder_with_connection_from_all(
            placeholder,
            Slot::Resource(Arc::clone(&resource)),
        )
        .await;

    match installed {
        Err(error @ Error::PlaceholderNotFound { .. }) => {
            tracing::debug!(%placeholder, "reservation vanished, discarding new connection");
            if let Err(disconnect) = pool
                .manager()
                .disconnect(Arc::clone(resource.connection()))
                .await
            {
                tracing::warn!(%resource_id, error = %disconnect, "failed to discard connection");
            }
            Err(error)
        }
        installed => {
            pool.events()
                .emit(PoolEvent::ConnectionCreated { resource_id });
            installed.map(|_| Outcome::Created { resource_id })
        }
    }
}

async fn give_back<M: Manager>(
    pool: &Pool<M>,
    connection: &Arc<M::Connection>,
) -> Result<Outcome> {
    let Some(resource) = pool.get_resource_from_connection_in_all(connection) else {
        tracing::debug!("returned connection is not pooled, disconnecting");
        pool.manager().disconnect(Arc::clone(connection)).await?;
        return Ok(Outcome::Done);
    };
    if resource.state() == ResourceState::Idle {
        tracing::debug!(resource_id = %resource.id(), "connection returned twice, ignoring");
        return Ok(Outcome::Done);
    }

    if !pool.manager().is_valid(connection).await {
        tracing::debug!(resource_id = %resource.id(), "returned connection is invalid");
        pool.destroy_connection(Arc::clone(connection)).await?;
        return Ok(Outcome::Done);
    }

    // A concurrent return may have won while validating; only one of them
    // moves the resource back.
    pool.release_allocated(&resource).await?;
    Ok(Outcome::Done)
}

async fn destroy<M: Manager>(pool: &Pool<M>, connection: &Arc<M::Connection>) -> Result<Outcome> {
    let Some(resource) = pool.get_resource_from_connection_in_all(connection) else {
        pool.manager().disconnect(Arc::clone(connection)).await?;
        return Ok(Outcome::Done);
    };

    pool.remove_resource_from_available(&resource);
    if !pool.remove_resource_from_all(&resource) {
        // Lost a race with another destroy.
        return Ok(Outcome::Done);
    }
    discard(pool, &resource).await
}

/// Disconnect a resource already taken out of every registry, then let
/// waiting requests use the freed room.
async fn discard<M: Manager>(
    pool: &Pool<M>,
    resource: &Arc<Resource<M::Connection>>,
) -> Result<Outcome> {
    let resource_id = resource.id();
    let disconnected = pool
        .manager()
        .disconnect(Arc::clone(resource.connection()))
        .await;
    pool.events()
        .emit(PoolEvent::ConnectionDestroyed { resource_id });

    if pool.pending_request_num() > 0 {
        pool.notify_all_operators(Some(&Task::acquire())).await?;
    }
    disconnected?;
    Ok(Outcome::Destroyed { resource_id })
}

async fn reap<M: Manager>(pool: &Pool<M>) -> Result<Outcome> {
    let idle_timeout = pool.options().idle_timeout;
    let min = pool.options().min;

    let mut destroyed = 0;
    for resource in pool.available_resources() {
        if pool.pool_size() <= min {
            break;
        }
        // Re-checked under the lock: the resource may have been handed out
        // since the snapshot.
        if !pool.evict_idle(&resource, idle_timeout) {
            continue;
        }
        discard(pool, &resource).await?;
        destroyed += 1;
    }
    if destroyed > 0 {
        tracing::debug!(destroyed, "reaped idle connections");
    }
    Ok(Outcome::Reaped { destroyed })
}
