//! Concurrent access tests for the engine manager and the service.

use html2pdf_gateway::engine::mock::MockEngineLauncher;
use html2pdf_gateway::prelude::*;
use std::time::Duration;
use tokio::task::JoinSet;

const KEY: &str = "concurrent-test-key";

fn shared_manager(launcher: MockEngineLauncher) -> SharedEngineManager {
    RenderEngineManager::builder()
        .launcher(Box::new(launcher))
        .build()
        .unwrap()
        .into_shared()
}

/// Many first requests racing each other trigger exactly one launch.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_acquire_launches_once() {
    let launcher = MockEngineLauncher::new().with_launch_delay(Duration::from_millis(100));
    let telemetry = launcher.telemetry();
    let manager = shared_manager(launcher);

    let mut tasks = JoinSet::new();
    for _ in 0..16 {
        let manager = Arc::clone(&manager);
        tasks.spawn(async move { manager.acquire().await.map(|handle| handle.id()) });
    }

    let mut ids = Vec::new();
    while let Some(result) = tasks.join_next().await {
        ids.push(result.expect("task should not panic").expect("acquire should succeed"));
    }

    assert_eq!(telemetry.launch_count(), 1);
    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]), "all callers share one engine");

    let stats = manager.stats();
    assert!(stats.is_ready());
    assert_eq!(stats.launches, 1);
}

/// Concurrent conversions each get their own context, all of which are closed.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_conversions_share_engine() {
    let launcher = MockEngineLauncher::new();
    let telemetry = launcher.telemetry();
    let service = PdfService::new(shared_manager(launcher), Arc::new(StaticApiKey::new(KEY)))
        .into_shared();

    let mut tasks = JoinSet::new();
    for i in 0..12 {
        let service = Arc::clone(&service);
        tasks.spawn(async move {
            let body = format!(
                r#"{{"htmlData":["PGgxPkhlbGxvPC9oMT4="],"fileName":"doc-{}.pdf"}}"#,
                i
            );
            service.handle(Some(KEY), body.as_bytes()).await
        });
    }

    while let Some(result) = tasks.join_next().await {
        let pdf = result.unwrap().unwrap();
        assert!(pdf.filename.starts_with("doc-"));
    }

    assert_eq!(telemetry.launch_count(), 1);
    assert_eq!(telemetry.contexts_opened(), 12);
    assert_eq!(telemetry.contexts_closed(), 12);
}

/// A disconnected engine is noticed on the next acquire and replaced.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_degraded_engine_is_relaunched() {
    let launcher = MockEngineLauncher::new();
    let telemetry = launcher.telemetry();
    let manager = shared_manager(launcher);

    let first = manager.acquire().await.unwrap().id();
    assert!(telemetry.disconnect_latest());

    let second = manager.acquire().await.unwrap().id();

    assert_ne!(first, second);
    assert_eq!(telemetry.launch_count(), 2);
    assert_eq!(telemetry.engines_closed(), 1);
    assert_eq!(manager.stats().relaunches(), 1);
}

/// A failed launch leaves the manager retryable rather than stuck.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_launch_failure_is_retried() {
    let launcher = MockEngineLauncher::fail_after_n(1, "chrome crashed");
    let telemetry = launcher.telemetry();
    let manager = shared_manager(launcher);

    manager.acquire().await.unwrap();
    assert!(telemetry.disconnect_latest());

    for _ in 0..3 {
        match manager.acquire().await {
            Err(EngineError::Launch(msg)) => assert!(msg.contains("chrome crashed")),
            other => panic!("Expected launch failure, got {:?}", other.map(|h| h.id())),
        }
        assert_eq!(manager.state(), EngineState::Uninitialized);
    }

    // Initial launch, then one attempt per failed acquire.
    assert_eq!(telemetry.launch_count(), 4);
}

/// Shutdown closes the engine once; a later acquire launches a fresh one.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_then_relaunch() {
    let launcher = MockEngineLauncher::new();
    let telemetry = launcher.telemetry();
    let manager = shared_manager(launcher);

    let first = manager.acquire().await.unwrap().id();

    manager.shutdown().await;
    manager.shutdown().await;
    assert_eq!(manager.state(), EngineState::Closed);
    assert_eq!(telemetry.engines_closed(), 1);

    let second = manager.acquire().await.unwrap().id();
    assert_ne!(first, second);
    assert_eq!(manager.state(), EngineState::Ready);
    assert_eq!(telemetry.launch_count(), 2);
}

/// Shutdown racing a slow launch waits for it and then closes the new engine.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shutdown_during_launch() {
    let launcher = MockEngineLauncher::new().with_launch_delay(Duration::from_millis(200));
    let telemetry = launcher.telemetry();
    let manager = shared_manager(launcher);

    let warming = manager.spawn_warm();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(manager.state(), EngineState::Initializing);

    manager.shutdown().await;
    warming.await.unwrap();

    assert_eq!(manager.state(), EngineState::Closed);
    assert_eq!(telemetry.launch_count(), 1);
    assert_eq!(telemetry.engines_closed(), 1);
}

/// A caller that gives up mid-launch does not strand the manager.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_acquire_does_not_strand_state() {
    let launcher = MockEngineLauncher::new().with_launch_delay(Duration::from_millis(200));
    let telemetry = launcher.telemetry();
    let manager = shared_manager(launcher);

    let gave_up = tokio::time::timeout(Duration::from_millis(20), manager.acquire()).await;
    assert!(gave_up.is_err());

    // The detached launch still completes and publishes the engine.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(manager.state(), EngineState::Ready);

    manager.acquire().await.unwrap();
    assert_eq!(telemetry.launch_count(), 1);
}

/// Stats can be read from many tasks while launches happen.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_stats_access() {
    let manager = shared_manager(MockEngineLauncher::new());

    let mut tasks = JoinSet::new();
    for i in 0..10 {
        let manager = Arc::clone(&manager);
        tasks.spawn(async move {
            if i % 3 == 0 {
                manager.acquire().await.unwrap();
            }
            for _ in 0..100 {
                let _stats = manager.stats();
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        assert!(result.is_ok(), "Task should complete without panic");
    }

    assert_eq!(manager.stats().launches, 1);
}
