//! Idle-timeout reaper.
//!
//! A spawned loop that dispatches `CHECK_IDLE_TIMEOUT` once per period. It
//! holds only a weak reference to the pool, so dropping the last pool handle
//! ends it, and it is stopped explicitly through a [`CancellationToken`].
//! A failed tick has nobody to report to; the fault goes to the pool's
//! event sink instead.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::events::PoolEvent;
use crate::manager::Manager;
use crate::pool::{Pool, PoolInner};
use crate::task::Task;

/// Handle to a running reaper loop.
pub(crate) struct Reaper {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    period: Duration,
}

impl Reaper {
    /// Spawn the loop. The first tick fires one `period` after start.
    pub(crate) fn start<M: Manager>(weak: Weak<PoolInner<M>>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let Some(pool) = Pool::upgrade(&weak) else {
                    break;
                };
                tick(&pool).await;
            }

            tracing::debug!("idle reaper stopped");
        });

        tracing::debug!(period_ms = period.as_millis(), "idle reaper started");
        Self {
            cancel,
            handle,
            period,
        }
    }

    /// Stop the loop. A tick already in progress runs to completion.
    pub(crate) fn stop(self) {
        self.cancel.cancel();
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.handle.is_finished()
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Reaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaper")
            .field("period", &self.period)
            .field("running", &self.is_running())
            .finish()
    }
}

async fn tick<M: Manager>(pool: &Pool<M>) {
    let task = Task::check_idle_timeout();
    if let Err(error) = pool.notify_all_operators(Some(&task)).await {
        tracing::warn!(%error, "idle timeout check failed");
        pool.events().emit(PoolEvent::error(error));
    }
}
