// Dispatch throughput benchmarks.
//
// Measures acquire/return round trips through the reference operators with a
// manager that does no I/O, so only pool bookkeeping and dispatch are timed.

use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use criterion::{Criterion, criterion_group, criterion_main};
use nebula_pool::{Manager, Pool, PoolOptions, Result, Task};

struct NoOpManager;

#[async_trait]
impl Manager for NoOpManager {
    type Parameters = ();
    type Connection = u64;

    async fn connect(&self, _parameters: &()) -> Result<u64> {
        Ok(0)
    }

    async fn disconnect(&self, _connection: Arc<u64>) -> Result<()> {
        Ok(())
    }
}

fn options(max: usize) -> PoolOptions {
    PoolOptions {
        min: max,
        max,
        acquire_timeout: Duration::from_secs(5),
        idle_timeout: Duration::from_secs(3600),
        check_interval: None,
    }
}

fn acquire_return_round_trip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("failed to build runtime");
    let pool = Pool::new(NoOpManager, (), options(8)).expect("failed to create pool");
    rt.block_on(pool.initialize()).expect("failed to initialize");

    c.bench_function("acquire_return_round_trip", |b| {
        b.iter(|| {
            rt.block_on(async {
                let connection = pool.acquire().await.unwrap().detach();
                black_box(*connection);
                pool.return_connection(connection).await.unwrap();
            });
        });
    });
}

// ACQUIRE with an empty request list: one claim, no registry work.
fn idle_acquire_dispatch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("failed to build runtime");
    let pool = Pool::new(NoOpManager, (), options(1)).expect("failed to create pool");
    let task = Task::acquire();

    c.bench_function("idle_acquire_dispatch", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(pool.notify_all_operators(Some(&task)).await.unwrap());
            });
        });
    });
}

criterion_group!(benches, acquire_return_round_trip, idle_acquire_dispatch);
criterion_main!(benches);
