//! Idle-timeout reaper lifecycle, on paused time.

use std::sync::Arc;
use std::time::Duration;

use nebula_pool::testing::{
    MockConnection, MockManager, RecordingOperator, RecordingSink, StaticOperator,
};
use nebula_pool::{Error, EventType, Outcome, Pool, PoolEvent, PoolOptions, Resource, TaskType};

const PERIOD: Duration = Duration::from_secs(1);

fn options(min: usize, check_interval: Option<Duration>) -> PoolOptions {
    PoolOptions {
        min,
        max: 4,
        idle_timeout: Duration::from_secs(10),
        check_interval,
        ..PoolOptions::default()
    }
}

fn resource(id: u64) -> Arc<Resource<MockConnection>> {
    Arc::new(Resource::new(MockConnection::new(id)))
}

/// Pool that claims `ACQUIRE` trivially and answers `CHECK_IDLE_TIMEOUT`
/// with `check`.
fn scripted_pool(check: StaticOperator, sink: Arc<RecordingSink>) -> Pool<MockManager> {
    Pool::builder(MockManager::new(), ())
        .options(options(0, Some(PERIOD)))
        .operator(StaticOperator::claiming(
            "acquire",
            [TaskType::Acquire],
            Outcome::Done,
        ))
        .operator(check)
        .event_sink(sink)
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn starts_lazily_and_stops_when_available_drains() {
    let sink = Arc::new(RecordingSink::new());
    let pool = scripted_pool(
        StaticOperator::claiming("check", [TaskType::CheckIdleTimeout], Outcome::Done),
        sink,
    );
    assert!(!pool.is_reaper_running());

    let a = resource(1);
    let b = resource(2);
    pool.add_resource_to_available(Arc::clone(&a)).await.unwrap();
    assert!(pool.is_reaper_running());
    pool.add_resource_to_available(Arc::clone(&b)).await.unwrap();
    assert!(pool.is_reaper_running());

    assert!(pool.remove_resource_from_available(&a));
    assert!(pool.is_reaper_running());
    assert!(pool.remove_resource_from_available(&b));
    assert!(!pool.is_reaper_running());

    // Removing from an already empty queue keeps it stopped.
    assert!(!pool.remove_resource_from_available(&b));
    assert!(!pool.is_reaper_running());
}

#[tokio::test(start_paused = true)]
async fn ticks_once_per_period() {
    let sink = Arc::new(RecordingSink::new());
    let recorder = RecordingOperator::new();
    let pool = Pool::builder(MockManager::new(), ())
        .options(options(0, Some(PERIOD)))
        .operator(recorder.clone())
        .operator(StaticOperator::claiming(
            "all",
            [TaskType::Acquire, TaskType::CheckIdleTimeout],
            Outcome::Done,
        ))
        .event_sink(sink.clone())
        .build()
        .unwrap();

    pool.add_resource_to_available(resource(1)).await.unwrap();
    assert_eq!(recorder.count(TaskType::CheckIdleTimeout), 0);

    tokio::time::sleep(PERIOD * 3 + PERIOD / 2).await;
    assert_eq!(recorder.count(TaskType::CheckIdleTimeout), 3);
    assert!(sink.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn more_available_resources_share_one_reaper() {
    let recorder = RecordingOperator::new();
    let pool = Pool::builder(MockManager::new(), ())
        .options(options(0, Some(PERIOD)))
        .operator(recorder.clone())
        .operator(StaticOperator::claiming(
            "all",
            [TaskType::Acquire, TaskType::CheckIdleTimeout],
            Outcome::Done,
        ))
        .build()
        .unwrap();

    pool.add_resource_to_available(resource(1)).await.unwrap();
    pool.add_resource_to_available(resource(2)).await.unwrap();
    assert_eq!(pool.available_resource_num(), 2);

    tokio::time::sleep(PERIOD * 3 + PERIOD / 2).await;
    assert_eq!(recorder.count(TaskType::CheckIdleTimeout), 3);
}

#[tokio::test(start_paused = true)]
async fn zero_interval_disables_the_reaper() {
    let recorder = RecordingOperator::new();
    let pool = Pool::builder(MockManager::new(), ())
        .options(options(0, Some(Duration::ZERO)))
        .operator(recorder.clone())
        .operator(StaticOperator::claiming(
            "all",
            [TaskType::Acquire, TaskType::CheckIdleTimeout],
            Outcome::Done,
        ))
        .build()
        .unwrap();

    for id in 0..3 {
        pool.add_resource_to_available(resource(id)).await.unwrap();
        assert!(!pool.is_reaper_running());
    }
    tokio::time::sleep(PERIOD * 3).await;
    assert_eq!(recorder.count(TaskType::CheckIdleTimeout), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_tick_emits_one_error_event() {
    let sink = Arc::new(RecordingSink::new());
    let pool = scripted_pool(
        StaticOperator::failing("check", [TaskType::CheckIdleTimeout], "scan failed"),
        sink.clone(),
    );

    pool.add_resource_to_available(resource(1)).await.unwrap();
    tokio::time::sleep(PERIOD * 2 + PERIOD / 2).await;

    assert_eq!(sink.event_types(), vec![EventType::Error, EventType::Error]);
    match &sink.events()[0] {
        PoolEvent::Error { error } => {
            assert!(matches!(**error, Error::Operator { .. }));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(pool.is_reaper_running());
}

#[tokio::test(start_paused = true)]
async fn unclaimed_tick_reports_no_operator() {
    let sink = Arc::new(RecordingSink::new());
    let pool = scripted_pool(
        StaticOperator::claiming("other", [TaskType::Create], Outcome::Done),
        sink.clone(),
    );

    pool.add_resource_to_available(resource(1)).await.unwrap();
    tokio::time::sleep(PERIOD + PERIOD / 2).await;

    let events = sink.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        PoolEvent::Error { error } => {
            assert!(error.to_string().contains("CHECK_IDLE_TIMEOUT"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn disabled_interval_never_starts_the_reaper() {
    let pool = Pool::builder(MockManager::new(), ())
        .options(options(0, None))
        .operator(StaticOperator::claiming(
            "acquire",
            [TaskType::Acquire],
            Outcome::Done,
        ))
        .build()
        .unwrap();

    pool.add_resource_to_available(resource(1)).await.unwrap();
    assert!(!pool.is_reaper_running());
}

#[tokio::test(start_paused = true)]
async fn clear_stops_the_reaper() {
    let sink = Arc::new(RecordingSink::new());
    let pool = scripted_pool(
        StaticOperator::claiming("check", [TaskType::CheckIdleTimeout], Outcome::Done),
        sink,
    );
    pool.add_resource_to_available(resource(1)).await.unwrap();
    assert!(pool.is_reaper_running());

    pool.clear();
    assert!(!pool.is_reaper_running());
}

#[tokio::test(start_paused = true)]
async fn reaps_idle_connections_down_to_min() {
    let sink = Arc::new(RecordingSink::new());
    let pool = Pool::builder(MockManager::new(), ())
        .options(options(1, Some(PERIOD)))
        .event_sink(sink.clone())
        .build()
        .unwrap();

    let connections: Vec<_> = futures::future::join_all((0..3).map(|_| pool.acquire()))
        .await
        .into_iter()
        .map(|guard| guard.unwrap().detach())
        .collect();
    assert_eq!(pool.pool_size(), 3);
    for connection in connections {
        pool.return_connection(connection).await.unwrap();
    }
    assert_eq!(pool.available_resource_num(), 3);
    assert!(pool.is_reaper_running());

    // Not idle long enough yet.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(pool.pool_size(), 3);

    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(pool.pool_size(), 1);
    assert_eq!(pool.manager().disconnects(), 2);
    assert_eq!(sink.count(EventType::ConnectionDestroyed), 2);
    assert!(pool.is_reaper_running());
}

#[tokio::test(start_paused = true)]
async fn reaping_everything_stops_the_reaper() {
    let pool = Pool::new(MockManager::new(), (), options(0, Some(PERIOD))).unwrap();

    let connection = pool.acquire().await.unwrap().detach();
    pool.return_connection(connection).await.unwrap();
    assert!(pool.is_reaper_running());

    tokio::time::sleep(Duration::from_secs(12)).await;
    assert_eq!(pool.pool_size(), 0);
    assert!(!pool.is_reaper_running());
}
