//! Test doubles for pools and operators

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::events::{EventSink, EventType, PoolEvent};
use crate::manager::Manager;
use crate::operator::{Operator, Outcome};
use crate::pool::Pool;
use crate::task::{Task, TaskType};

/// Connection produced by [`MockManager`].
#[derive(Debug, PartialEq, Eq)]
pub struct MockConnection {
    pub id: u64,
}

impl MockConnection {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self { id }
    }
}

#[derive(Default)]
struct MockState {
    next_id: AtomicU64,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    fail_connect: AtomicBool,
    invalid: AtomicBool,
    connect_delay: Mutex<Option<Duration>>,
}

/// Manager counting connects and disconnects, with switchable failure
/// and validity. Clones share counters.
#[derive(Clone, Default)]
pub struct MockManager {
    state: Arc<MockState>,
}

impl MockManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every `connect`.
    #[must_use]
    pub fn with_connect_delay(self, delay: Duration) -> Self {
        *self.state.connect_delay.lock() = Some(delay);
        self
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.state.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Make `is_valid` report every connection as broken.
    pub fn set_invalid(&self, invalid: bool) {
        self.state.invalid.store(invalid, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.state.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Manager for MockManager {
    type Parameters = ();
    type Connection = MockConnection;

    async fn connect(&self, _parameters: &()) -> Result<MockConnection> {
        let delay = *self.state.connect_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(Error::connect("mock connect refused"));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        let id = self.state.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(MockConnection::new(id))
    }

    async fn is_valid(&self, _connection: &MockConnection) -> bool {
        !self.state.invalid.load(Ordering::SeqCst)
    }

    async fn disconnect(&self, connection: Arc<MockConnection>) -> Result<()> {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        drop(connection);
        Ok(())
    }
}

enum Reply {
    Claim(Outcome),
    Fail(String),
}

/// Operator claiming a fixed set of task types with a canned reply.
pub struct StaticOperator {
    name: String,
    claims: HashSet<TaskType>,
    reply: Reply,
    attempts: AtomicUsize,
}

impl StaticOperator {
    /// Claim `task_types`, answering with `outcome`.
    pub fn claiming(
        name: impl Into<String>,
        task_types: impl IntoIterator<Item = TaskType>,
        outcome: Outcome,
    ) -> Self {
        Self {
            name: name.into(),
            claims: task_types.into_iter().collect(),
            reply: Reply::Claim(outcome),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Claim `task_types` and fail each with an operator error.
    pub fn failing(
        name: impl Into<String>,
        task_types: impl IntoIterator<Item = TaskType>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            claims: task_types.into_iter().collect(),
            reply: Reply::Fail(message.into()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// How many tasks were offered, claimed or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<M: Manager> Operator<M> for StaticOperator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self, _pool: &Pool<M>, task: &Task<M::Connection>) -> Result<Option<Outcome>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.claims.contains(&task.task_type()) {
            return Ok(None);
        }
        match &self.reply {
            Reply::Claim(outcome) => Ok(Some(outcome.clone())),
            Reply::Fail(message) => Err(Error::operator(&self.name, message.clone())),
        }
    }
}

/// Operator that declines everything and records what it saw. Clones
/// share the record.
#[derive(Clone, Default)]
pub struct RecordingOperator {
    seen: Arc<Mutex<Vec<TaskType>>>,
}

impl RecordingOperator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<TaskType> {
        self.seen.lock().clone()
    }

    pub fn count(&self, task_type: TaskType) -> usize {
        self.seen.lock().iter().filter(|t| **t == task_type).count()
    }
}

#[async_trait]
impl<M: Manager> Operator<M> for RecordingOperator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn attempt(&self, _pool: &Pool<M>, task: &Task<M::Connection>) -> Result<Option<Outcome>> {
        self.seen.lock().push(task.task_type());
        Ok(None)
    }
}

/// Event sink collecting everything emitted.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PoolEvent>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PoolEvent> {
        self.events.lock().clone()
    }

    pub fn event_types(&self) -> Vec<EventType> {
        self.events.lock().iter().map(PoolEvent::event_type).collect()
    }

    pub fn count(&self, event_type: EventType) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.event_type() == event_type)
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PoolEvent) {
        self.events.lock().push(event);
    }
}
