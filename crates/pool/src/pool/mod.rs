//! The pool orchestrator.
//!
//! [`Pool`] owns the three registries (all-resources, available-resources,
//! request-list) and is the only thing that mutates them. Every mutator
//! applies its registry change in one synchronous critical section, then
//! dispatches a [`Task`] to the registered operators and reports the
//! dispatch outcome as its own.

mod options;
mod registry;

pub use options::{PoolOptions, RawPoolOptions};

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::events::{EventSink, TracingSink};
use crate::guard::PooledConnection;
use crate::manager::Manager;
use crate::operator::{ConnectionOperator, Operator, Outcome, RequestOperator};
use crate::reaper::Reaper;
use crate::request::Request;
use crate::resource::{Placeholder, Resource, ResourceState, Slot};
use crate::task::Task;
use registry::Registry;

type Conn<M> = <M as Manager>::Connection;

pub(crate) struct PoolInner<M: Manager> {
    manager: M,
    parameters: M::Parameters,
    options: PoolOptions,
    operators: Vec<Arc<dyn Operator<M>>>,
    events: Arc<dyn EventSink>,
    state: Mutex<Registry<Conn<M>>>,
}

/// Operator-dispatched connection pool.
///
/// `Pool` is a cheap handle: clones share the same registries.
pub struct Pool<M: Manager> {
    inner: Arc<PoolInner<M>>,
}

impl<M: Manager> Clone for Pool<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: Manager> Pool<M> {
    /// Create a pool with the reference operators ([`ConnectionOperator`]
    /// then [`RequestOperator`]) and the [`TracingSink`].
    pub fn new(manager: M, parameters: M::Parameters, options: PoolOptions) -> Result<Self> {
        Self::builder(manager, parameters).options(options).build()
    }

    /// Start configuring a pool.
    pub fn builder(manager: M, parameters: M::Parameters) -> PoolBuilder<M> {
        PoolBuilder {
            manager,
            parameters,
            options: PoolOptions::default(),
            operators: None,
            events: None,
        }
    }

    pub(crate) fn upgrade(inner: &Weak<PoolInner<M>>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    // -- configuration ------------------------------------------------------

    /// Connection parameters, forwarded verbatim to the manager.
    pub fn parameters(&self) -> &M::Parameters {
        &self.inner.parameters
    }

    pub fn options(&self) -> &PoolOptions {
        &self.inner.options
    }

    pub fn manager(&self) -> &M {
        &self.inner.manager
    }

    pub fn operator_count(&self) -> usize {
        self.inner.operators.len()
    }

    /// The sink background paths report to.
    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.inner.events
    }

    // -- registry accessors -------------------------------------------------

    /// Entries in all-resources, placeholders included.
    pub fn pool_size(&self) -> usize {
        self.inner.state.lock().pool_size()
    }

    pub fn available_resource_num(&self) -> usize {
        self.inner.state.lock().available.len()
    }

    /// `max - pool_size`, never below zero.
    pub fn room(&self) -> usize {
        self.inner.state.lock().room(self.inner.options.max)
    }

    pub fn placeholder_num(&self) -> usize {
        self.inner.state.lock().placeholder_num()
    }

    /// Positional read of the available queue; `None` when out of range.
    pub fn get_available_resource(&self, index: usize) -> Option<Arc<Resource<Conn<M>>>> {
        self.inner.state.lock().available.get(index).cloned()
    }

    /// Length of the request list, finished requests included.
    pub fn request_list_len(&self) -> usize {
        self.inner.state.lock().requests.len()
    }

    pub fn pending_request_num(&self) -> usize {
        self.inner.state.lock().pending_request_num()
    }

    /// Snapshot of all-resources in order.
    pub fn all_resources(&self) -> Vec<Slot<Conn<M>>> {
        self.inner.state.lock().all_resources.clone()
    }

    /// Snapshot of the available queue, oldest first.
    pub fn available_resources(&self) -> Vec<Arc<Resource<Conn<M>>>> {
        self.inner.state.lock().available.iter().cloned().collect()
    }

    /// Snapshot of the request list, oldest first.
    pub fn requests(&self) -> Vec<Arc<Request<Conn<M>>>> {
        self.inner.state.lock().requests.iter().cloned().collect()
    }

    /// Whether the idle reaper is currently running.
    pub fn is_reaper_running(&self) -> bool {
        self.inner
            .state
            .lock()
            .reaper
            .as_ref()
            .is_some_and(Reaper::is_running)
    }

    // -- queue operations ---------------------------------------------------

    pub fn dequeue_from_available_resources(&self) -> Option<Arc<Resource<Conn<M>>>> {
        self.inner.state.lock().available.pop_front()
    }

    pub fn dequeue_from_request_list(&self) -> Option<Arc<Request<Conn<M>>>> {
        self.inner.state.lock().requests.pop_front()
    }

    /// Identity-based removal; absent resources are ignored.
    pub fn remove_resource_from_all(&self, resource: &Arc<Resource<Conn<M>>>) -> bool {
        self.inner.state.lock().remove_from_all(resource)
    }

    /// Identity-based removal from the available queue. Stops the reaper
    /// once the queue is empty.
    pub fn remove_resource_from_available(&self, resource: &Arc<Resource<Conn<M>>>) -> bool {
        let mut state = self.inner.state.lock();
        let removed = state.remove_from_available(resource);
        if state.available.is_empty() && state.stop_reaper() {
            tracing::debug!("available queue drained, idle reaper stopped");
        }
        removed
    }

    pub fn remove_request_from_list(&self, request: &Arc<Request<Conn<M>>>) -> bool {
        self.inner.state.lock().remove_request(request)
    }

    /// The resource wrapping exactly `connection`, if the pool holds one.
    pub fn get_resource_from_connection_in_all(
        &self,
        connection: &Arc<Conn<M>>,
    ) -> Option<Arc<Resource<Conn<M>>>> {
        self.inner.state.lock().find_by_connection(connection)
    }

    /// Purge fulfilled and rejected requests. Returns how many went.
    pub fn remove_non_pending_request(&self) -> usize {
        self.inner.state.lock().remove_non_pending()
    }

    /// Reserve one capacity slot, or `None` when the pool has no room.
    pub fn reserve_placeholder(&self) -> Option<Placeholder> {
        let mut state = self.inner.state.lock();
        if state.room(self.inner.options.max) == 0 {
            return None;
        }
        let placeholder = Placeholder::new();
        state.all_resources.push(Slot::Placeholder(placeholder));
        tracing::debug!(%placeholder, "capacity reserved");
        Some(placeholder)
    }

    /// Drop a reservation, e.g. after a failed creation.
    pub fn remove_placeholder(&self, placeholder: Placeholder) -> bool {
        self.inner.state.lock().remove_placeholder(placeholder)
    }

    pub(crate) fn take_next_match(
        &self,
    ) -> Option<(Arc<Request<Conn<M>>>, Arc<Resource<Conn<M>>>)> {
        self.inner.state.lock().take_next_match()
    }

    /// Put a resource back at the head of the available queue without
    /// dispatching.
    pub(crate) fn requeue_front(&self, resource: Arc<Resource<Conn<M>>>) {
        resource.mark_idle();
        self.inner.state.lock().available.push_front(resource);
    }

    // -- mutation + dispatch ------------------------------------------------

    /// Append a request, then dispatch `ACQUIRE`. The append stays even if
    /// the dispatch fails.
    pub async fn add_request_to_request_list(
        &self,
        request: Arc<Request<Conn<M>>>,
    ) -> Result<Outcome> {
        self.inner.state.lock().requests.push_back(request);
        self.notify_all_operators(Some(&Task::acquire())).await
    }

    /// Append to all-resources.
    ///
    /// `None` is a no-op. Placeholders are appended without dispatch; real
    /// resources dispatch `REGISTER`.
    pub async fn add_resource_to_all(
        &self,
        slot: impl Into<Option<Slot<Conn<M>>>>,
    ) -> Result<Option<Outcome>> {
        let slot: Option<Slot<Conn<M>>> = slot.into();
        let Some(slot) = slot else {
            return Ok(None);
        };
        {
            let mut state = self.inner.state.lock();
            let max = self.inner.options.max;
            if state.pool_size() >= max {
                return Err(Error::PoolFull { max });
            }
            state.all_resources.push(slot.clone());
        }
        match slot {
            Slot::Placeholder(_) => Ok(None),
            Slot::Resource(resource) => self
                .notify_all_operators(Some(&Task::register(resource)))
                .await
                .map(Some),
        }
    }

    /// Mark `resource` idle, enqueue it, manage the reaper, then dispatch
    /// `ACQUIRE`.
    pub async fn add_resource_to_available(
        &self,
        resource: Arc<Resource<Conn<M>>>,
    ) -> Result<Outcome> {
        self.enqueue_available(&mut self.inner.state.lock(), resource);
        self.notify_all_operators(Some(&Task::acquire())).await
    }

    /// Move an allocated resource back to the available queue in one
    /// critical section, then dispatch `ACQUIRE`. Returns `None` without
    /// dispatching when the resource is already idle or no longer pooled.
    pub(crate) async fn release_allocated(
        &self,
        resource: &Arc<Resource<Conn<M>>>,
    ) -> Result<Option<Outcome>> {
        {
            let mut state = self.inner.state.lock();
            if resource.state() != ResourceState::Allocated || !state.holds(resource) {
                return Ok(None);
            }
            self.enqueue_available(&mut state, Arc::clone(resource));
        }
        self.notify_all_operators(Some(&Task::acquire()))
            .await
            .map(Some)
    }

    /// Take an idle resource out of the pool if it is still queued, has been
    /// idle for at least `idle_timeout`, and the pool is above `min`. The
    /// caller owns disconnecting it.
    pub(crate) fn evict_idle(
        &self,
        resource: &Arc<Resource<Conn<M>>>,
        idle_timeout: Duration,
    ) -> bool {
        let mut state = self.inner.state.lock();
        if state.pool_size() <= self.inner.options.min || resource.idle_for() < idle_timeout {
            return false;
        }
        if !state.remove_from_available(resource) {
            return false;
        }
        state.remove_from_all(resource);
        if state.available.is_empty() && state.stop_reaper() {
            tracing::debug!("available queue drained, idle reaper stopped");
        }
        true
    }

    fn enqueue_available(&self, state: &mut Registry<Conn<M>>, resource: Arc<Resource<Conn<M>>>) {
        resource.mark_idle();
        tracing::debug!(resource_id = %resource.id(), "resource available");
        state.available.push_back(resource);
        let running = state.reaper.as_ref().is_some_and(Reaper::is_running);
        match self.inner.options.reap_period() {
            Some(period) if !running => {
                state.reaper = Some(Reaper::start(Arc::downgrade(&self.inner), period));
            }
            None if state.reaper.is_some() => {
                state.stop_reaper();
            }
            _ => {}
        }
    }

    /// Swap `placeholder` for `slot` at the same position.
    ///
    /// Fails with [`Error::PlaceholderNotFound`] when the reservation is
    /// gone. Dispatches `REGISTER` unless `slot` is another placeholder.
    pub async fn replace_placeholder_with_connection_from_all(
        &self,
        placeholder: Placeholder,
        slot: Slot<Conn<M>>,
    ) -> Result<Option<Outcome>> {
        {
            let mut state = self.inner.state.lock();
            let Some(index) = state.placeholder_position(placeholder) else {
                return Err(Error::PlaceholderNotFound { placeholder });
            };
            state.all_resources[index] = slot.clone();
        }
        match slot {
            Slot::Placeholder(_) => Ok(None),
            Slot::Resource(resource) => self
                .notify_all_operators(Some(&Task::register(resource)))
                .await
                .map(Some),
        }
    }

    /// Hand a connection back. `None` is a usage fault.
    pub async fn return_connection(
        &self,
        connection: impl Into<Option<Arc<Conn<M>>>>,
    ) -> Result<Outcome> {
        let connection: Option<Arc<Conn<M>>> = connection.into();
        let connection = connection.ok_or(Error::NullConnection {
            operation: "return",
        })?;
        self.notify_all_operators(Some(&Task::return_connection(connection)))
            .await
    }

    /// Tear a connection down. `None` succeeds without dispatch.
    pub async fn destroy_connection(
        &self,
        connection: impl Into<Option<Arc<Conn<M>>>>,
    ) -> Result<Option<Outcome>> {
        let connection: Option<Arc<Conn<M>>> = connection.into();
        let Some(connection) = connection else {
            return Ok(None);
        };
        self.notify_all_operators(Some(&Task::destroy(connection)))
            .await
            .map(Some)
    }

    /// Empty every registry and stop the reaper. Requests still pending
    /// fail with [`Error::Cleared`].
    pub fn clear(&self) {
        let dropped = self.inner.state.lock().clear();
        let mut rejected = 0usize;
        for request in dropped {
            if request.reject(Error::Cleared) {
                rejected += 1;
            }
        }
        tracing::debug!(rejected, "pool cleared");
    }

    /// Dispatch `INITIALIZE_POOL` once. A second call is a usage fault.
    pub async fn initialize(&self) -> Result<Outcome> {
        if self.inner.state.lock().initialized {
            return Err(Error::AlreadyInitialized);
        }
        let outcome = self
            .notify_all_operators(Some(&Task::initialize_pool()))
            .await?;
        self.inner.state.lock().initialized = true;
        Ok(outcome)
    }

    pub fn is_pool_initialized(&self) -> bool {
        self.inner.state.lock().initialized
    }

    /// Destroy every idle connection, then [`clear`](Self::clear).
    pub async fn shutdown(&self) {
        for resource in self.available_resources() {
            let resource_id = resource.id();
            if let Err(error) = self
                .destroy_connection(Arc::clone(resource.connection()))
                .await
            {
                tracing::warn!(%resource_id, %error, "failed to destroy connection on shutdown");
            }
        }
        self.clear();
    }

    // -- dispatch -----------------------------------------------------------

    /// Offer `task` to every operator concurrently.
    ///
    /// The first claim in registration order wins. Any operator error fails
    /// the dispatch (first error in registration order); no claim at all
    /// fails with [`Error::NoOperator`]. Operators take a concrete task, so
    /// `None` is reported as unclaimed without reaching any of them.
    pub async fn notify_all_operators(&self, task: Option<&Task<Conn<M>>>) -> Result<Outcome> {
        let Some(task) = task else {
            return Err(Error::no_operator(None));
        };
        tracing::debug!(task = %task.task_type(), "dispatching");

        let attempts = self
            .inner
            .operators
            .iter()
            .map(|operator| operator.attempt(self, task));
        let results = futures::future::join_all(attempts).await;

        let mut claimed = None;
        for result in results {
            match result {
                Err(error) => return Err(error),
                Ok(Some(outcome)) if claimed.is_none() => claimed = Some(outcome),
                Ok(_) => {}
            }
        }
        claimed.ok_or_else(|| Error::no_operator(Some(task.task_type())))
    }

    // -- caller-facing ------------------------------------------------------

    /// Wait for a connection, up to `acquire_timeout`.
    pub async fn acquire(&self) -> Result<PooledConnection<M>> {
        let (request, mut response) = Request::new();
        let request = Arc::new(request);

        if let Err(error) = self
            .add_request_to_request_list(Arc::clone(&request))
            .await
        {
            if request.abandon() {
                self.remove_request_from_list(&request);
                return Err(error);
            }
            tracing::debug!(request_id = %request.id(), %error, "request served despite dispatch failure");
        }

        let timeout = self.inner.options.acquire_timeout;
        let delivered = match tokio::time::timeout(timeout, &mut response).await {
            Ok(received) => received.unwrap_or(Err(Error::Cleared)),
            Err(_) if request.abandon() => {
                self.remove_request_from_list(&request);
                return Err(Error::AcquireTimeout {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
            Err(_) => response.try_recv().unwrap_or(Err(Error::Cleared)),
        };

        delivered.map(|connection| PooledConnection::new(self.clone(), connection))
    }
}

impl<M: Manager> std::fmt::Debug for Pool<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Pool")
            .field("pool_size", &state.pool_size())
            .field("available", &state.available.len())
            .field("requests", &state.requests.len())
            .field("initialized", &state.initialized)
            .field("operators", &self.inner.operators.len())
            .finish()
    }
}

/// Builder for [`Pool`].
pub struct PoolBuilder<M: Manager> {
    manager: M,
    parameters: M::Parameters,
    options: PoolOptions,
    operators: Option<Vec<Arc<dyn Operator<M>>>>,
    events: Option<Arc<dyn EventSink>>,
}

impl<M: Manager> PoolBuilder<M> {
    #[must_use]
    pub fn options(mut self, options: PoolOptions) -> Self {
        self.options = options;
        self
    }

    /// Register an operator. Once any operator is registered the reference
    /// pair is no longer installed implicitly.
    #[must_use]
    pub fn operator(mut self, operator: impl Operator<M> + 'static) -> Self {
        self.operators
            .get_or_insert_with(Vec::new)
            .push(Arc::new(operator));
        self
    }

    /// Start from an empty operator list.
    #[must_use]
    pub fn without_operators(mut self) -> Self {
        self.operators = Some(Vec::new());
        self
    }

    #[must_use]
    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Validate the options and build the pool.
    pub fn build(self) -> Result<Pool<M>> {
        self.options.validate()?;
        let operators = self.operators.unwrap_or_else(|| {
            vec![
                Arc::new(ConnectionOperator::new()) as Arc<dyn Operator<M>>,
                Arc::new(RequestOperator::new()) as Arc<dyn Operator<M>>,
            ]
        });
        let events = self.events.unwrap_or_else(|| Arc::new(TracingSink));
        Ok(Pool {
            inner: Arc::new(PoolInner {
                manager: self.manager,
                parameters: self.parameters,
                options: self.options,
                operators,
                events,
                state: Mutex::new(Registry::new()),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskType;
    use crate::testing::{MockConnection, MockManager, RecordingOperator, StaticOperator};

    fn bare_pool(max: usize) -> Pool<MockManager> {
        Pool::builder(MockManager::new(), ())
            .options(PoolOptions {
                max,
                check_interval: None,
                ..PoolOptions::default()
            })
            .without_operators()
            .build()
            .unwrap()
    }

    #[test]
    fn new_pool_is_empty() {
        let pool = bare_pool(3);
        assert_eq!(pool.pool_size(), 0);
        assert_eq!(pool.available_resource_num(), 0);
        assert_eq!(pool.room(), 3);
        assert_eq!(pool.placeholder_num(), 0);
        assert!(pool.get_available_resource(0).is_none());
        assert!(!pool.is_pool_initialized());
    }

    #[test]
    fn reference_configuration_has_two_operators() {
        let pool = Pool::new(MockManager::new(), (), PoolOptions::default()).unwrap();
        assert_eq!(pool.operator_count(), 2);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let err = Pool::new(
            MockManager::new(),
            (),
            PoolOptions {
                max: 0,
                ..PoolOptions::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn dequeue_on_empty_queues_is_none() {
        let pool = bare_pool(1);
        assert!(pool.dequeue_from_available_resources().is_none());
        assert!(pool.dequeue_from_request_list().is_none());
    }

    #[test]
    fn max_one_reservation_scenario() {
        let pool = bare_pool(1);
        assert_eq!(pool.room(), 1);
        assert!(pool.reserve_placeholder().is_some());
        assert_eq!(pool.room(), 0);
        assert!(pool.reserve_placeholder().is_none());
        assert_eq!(pool.room(), 0);
        assert_eq!(pool.placeholder_num(), 1);
    }

    fn acquire_claiming_pool(options: PoolOptions) -> Pool<MockManager> {
        Pool::builder(MockManager::new(), ())
            .options(options)
            .operator(StaticOperator::claiming(
                "acquire",
                [TaskType::Acquire],
                Outcome::Done,
            ))
            .build()
            .unwrap()
    }

    fn pooled(pool: &Pool<MockManager>, id: u64) -> Arc<Resource<MockConnection>> {
        let resource = Arc::new(Resource::new(MockConnection::new(id)));
        pool.inner
            .state
            .lock()
            .all_resources
            .push(Slot::Resource(Arc::clone(&resource)));
        resource
    }

    #[tokio::test(start_paused = true)]
    async fn zero_check_interval_never_spawns_a_reaper() {
        let pool = acquire_claiming_pool(PoolOptions {
            check_interval: Some(Duration::ZERO),
            ..PoolOptions::default()
        });

        for id in 0..3 {
            let resource = pooled(&pool, id);
            pool.add_resource_to_available(resource).await.unwrap();
        }
        assert!(pool.inner.state.lock().reaper.is_none());
        assert!(!pool.is_reaper_running());
        assert_eq!(pool.available_resource_num(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn evict_idle_skips_a_resource_handed_out_meanwhile() {
        let pool = acquire_claiming_pool(PoolOptions {
            check_interval: None,
            ..PoolOptions::default()
        });
        let timeout = pool.options().idle_timeout;
        let handed_out = pooled(&pool, 1);
        let idle = pooled(&pool, 2);
        pool.add_resource_to_available(Arc::clone(&handed_out))
            .await
            .unwrap();
        pool.add_resource_to_available(Arc::clone(&idle))
            .await
            .unwrap();
        tokio::time::advance(timeout * 2).await;

        // What a matching worker does between the reaper's snapshot and
        // its eviction.
        let taken = pool.dequeue_from_available_resources().unwrap();
        assert!(Arc::ptr_eq(&taken, &handed_out));
        taken.mark_allocated();

        assert!(!pool.evict_idle(&handed_out, timeout));
        assert!(pool.evict_idle(&idle, timeout));
        assert_eq!(pool.pool_size(), 1);
        assert!(pool.get_resource_from_connection_in_all(handed_out.connection()).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn evict_idle_respects_min_and_idle_age() {
        let pool = acquire_claiming_pool(PoolOptions {
            min: 1,
            check_interval: None,
            ..PoolOptions::default()
        });
        let timeout = pool.options().idle_timeout;
        let a = pooled(&pool, 1);
        let b = pooled(&pool, 2);
        pool.add_resource_to_available(Arc::clone(&a)).await.unwrap();
        pool.add_resource_to_available(Arc::clone(&b)).await.unwrap();

        assert!(!pool.evict_idle(&a, timeout));
        tokio::time::advance(timeout).await;
        assert!(pool.evict_idle(&a, timeout));
        assert!(!pool.evict_idle(&b, timeout));
        assert_eq!(pool.pool_size(), 1);
        assert_eq!(pool.available_resource_num(), 1);
    }

    #[tokio::test]
    async fn concurrent_release_enqueues_once() {
        let pool = acquire_claiming_pool(PoolOptions {
            check_interval: None,
            ..PoolOptions::default()
        });
        let resource = pooled(&pool, 1);
        resource.mark_allocated();

        let (first, second) = tokio::join!(
            pool.release_allocated(&resource),
            pool.release_allocated(&resource)
        );
        let released = [first.unwrap(), second.unwrap()]
            .into_iter()
            .filter(Option::is_some)
            .count();
        assert_eq!(released, 1);
        assert_eq!(pool.available_resource_num(), 1);
        assert_eq!(resource.state(), ResourceState::Idle);
    }

    #[tokio::test]
    async fn release_ignores_resources_the_pool_dropped() {
        let pool = acquire_claiming_pool(PoolOptions {
            check_interval: None,
            ..PoolOptions::default()
        });
        let resource = pooled(&pool, 1);
        resource.mark_allocated();
        pool.clear();

        assert_eq!(pool.release_allocated(&resource).await.unwrap(), None);
        assert_eq!(pool.available_resource_num(), 0);
    }

    #[tokio::test]
    async fn add_placeholder_to_all_skips_dispatch() {
        let recorder = RecordingOperator::new();
        let pool = Pool::builder(MockManager::new(), ())
            .options(PoolOptions {
                check_interval: None,
                ..PoolOptions::default()
            })
            .operator(recorder.clone())
            .build()
            .unwrap();

        let outcome = pool
            .add_resource_to_all(Slot::Placeholder(Placeholder::new()))
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(pool.pool_size(), 1);
        assert!(recorder.seen().is_empty());

        assert!(pool.add_resource_to_all(None).await.unwrap().is_none());
        assert_eq!(pool.pool_size(), 1);
    }

    #[tokio::test]
    async fn add_resource_to_all_respects_max() {
        let pool = Pool::builder(MockManager::new(), ())
            .options(PoolOptions {
                max: 1,
                check_interval: None,
                ..PoolOptions::default()
            })
            .operator(StaticOperator::claiming(
                "register",
                [TaskType::Register],
                Outcome::Done,
            ))
            .build()
            .unwrap();

        pool.add_resource_to_all(Slot::Resource(Arc::new(Resource::new(
            crate::testing::MockConnection::new(1),
        ))))
        .await
        .unwrap();
        let err = pool
            .add_resource_to_all(Slot::Placeholder(Placeholder::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PoolFull { max: 1 }));
        assert_eq!(pool.pool_size(), 1);
    }

    #[tokio::test]
    async fn dispatch_without_task_names_none() {
        let pool = bare_pool(1);
        let err = pool.notify_all_operators(None).await.unwrap_err();
        assert!(err.to_string().contains("None"));

        let recorder = RecordingOperator::new();
        let pool = Pool::builder(MockManager::new(), ())
            .operator(recorder.clone())
            .build()
            .unwrap();
        assert!(pool.notify_all_operators(None).await.is_err());
        assert!(recorder.seen().is_empty());
    }

    #[tokio::test]
    async fn initialize_sets_flag_only_on_success() {
        let pool = bare_pool(1);
        let err = pool.initialize().await.unwrap_err();
        assert!(err.to_string().contains("INITIALIZE_POOL"));
        assert!(!pool.is_pool_initialized());
    }
}
