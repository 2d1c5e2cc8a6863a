//! 并发解析的集成测试

mod common;

use common::*;
use modular_core::{AppCore, ComponentLifecycle, ComponentState, CoreError};
use std::sync::{Arc, Barrier};
use std::time::Duration;

const CALLERS: usize = 8;

/// 在多个阻塞线程中同时执行 `resolve`
async fn race<R, F>(resolve: F) -> Vec<R>
where
    R: Send + 'static,
    F: Fn() -> R + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(CALLERS));
    let resolve = Arc::new(resolve);

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let resolve = Arc::clone(&resolve);
            tokio::task::spawn_blocking(move || {
                barrier.wait();
                resolve()
            })
        })
        .collect();

    let mut results = Vec::with_capacity(CALLERS);
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_get_resolves_once() {
    let log = event_log();
    let produced_log = Arc::clone(&log);
    let factory = Arc::new(
        ScriptedFactory::new("slow", 1, &log)
            .supporting::<dyn Foo>()
            .with_delay(Duration::from_millis(50))
            .producing(move |_| Some(foo(Tracked::new("shared", &produced_log)))),
    );
    let core = AppCore::builder()
        .with_default_factory(false)
        .with_shared_factory(factory.clone())
        .build();
    core.start().unwrap();

    let racing = Arc::clone(&core);
    let resolved = race(move || racing.get::<dyn Foo>().unwrap().unwrap()).await;

    assert_eq!(factory.produced(), 1);
    assert_eq!(count(&log, "start shared"), 1);
    assert!(resolved
        .iter()
        .all(|instance| Arc::ptr_eq(instance, &resolved[0])));
    assert_eq!(core.metrics().cached_singletons, 1);

    drop(resolved);
    core.stop().unwrap();
    assert_eq!(count(&log, "stop shared"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_misses_all_return_none() {
    let log = event_log();
    let factory = Arc::new(
        ScriptedFactory::new("declining", 1, &log)
            .supporting::<dyn Foo>()
            .with_delay(Duration::from_millis(10)),
    );
    let core = AppCore::builder()
        .with_default_factory(false)
        .with_shared_factory(factory.clone())
        .build();
    core.start().unwrap();

    let racing = Arc::clone(&core);
    let results = race(move || racing.get::<dyn Foo>().unwrap().is_none()).await;

    assert!(results.into_iter().all(|missed| missed));
    assert!(factory.produced() >= 1);
    assert_eq!(core.metrics().cached_singletons, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_yields_distinct_instances() {
    let log = event_log();
    let produced_log = Arc::clone(&log);
    let core = AppCore::builder()
        .with_default_factory(false)
        .with_factory(
            ScriptedFactory::new("widgets", 1, &log)
                .supporting::<dyn Widget>()
                .producing(move |_| Some(widget(Tracked::new("widget", &produced_log)))),
        )
        .build();
    core.start().unwrap();

    let racing = Arc::clone(&core);
    let mut serials = race(move || racing.create::<dyn Widget>().unwrap().unwrap().serial()).await;
    serials.sort_unstable();
    serials.dedup();

    assert_eq!(serials.len(), CALLERS);
    assert_eq!(core.metrics().created_components, CALLERS as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_stop_runs_hooks_once() {
    let log = event_log();
    let produced_log = Arc::clone(&log);
    let core = AppCore::builder()
        .with_default_factory(false)
        .with_factory(
            ScriptedFactory::new("trackers", 1, &log)
                .supporting::<dyn Foo>()
                .producing(move |_| Some(foo(Tracked::new("foo", &produced_log)))),
        )
        .build();
    core.start().unwrap();
    core.get::<dyn Foo>().unwrap();

    let racing = Arc::clone(&core);
    let results = race(move || racing.stop().is_ok()).await;

    assert!(results.into_iter().all(|stopped| stopped));
    assert_eq!(count(&log, "stop foo"), 1);
    assert_eq!(count(&log, "stop trackers"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stop_waits_for_resolution_in_flight() {
    let log = event_log();
    let produced_log = Arc::clone(&log);
    let core = AppCore::builder()
        .with_default_factory(false)
        .with_factory(
            ScriptedFactory::new("slow", 1, &log)
                .supporting::<dyn Foo>()
                .with_delay(Duration::from_millis(300))
                .producing(move |_| Some(foo(Tracked::new("late", &produced_log)))),
        )
        .build();
    core.start().unwrap();

    let resolving = Arc::clone(&core);
    let pending = tokio::task::spawn_blocking(move || resolving.get::<dyn Foo>());
    tokio::time::sleep(Duration::from_millis(100)).await;

    let stopping = Arc::clone(&core);
    tokio::task::spawn_blocking(move || stopping.stop())
        .await
        .unwrap()
        .unwrap();

    // 停止前完成的解析结果同样由核心停止
    let resolved = pending.await.unwrap().unwrap().expect("应当解析到 Foo");
    assert_eq!(resolved.state(), ComponentState::Stopped);
    assert_eq!(count(&log, "stop late"), 1);
    assert_eq!(
        events(&log),
        vec!["start slow", "start late", "stop late", "stop slow"]
    );
    assert!(matches!(core.get::<dyn Foo>(), Err(CoreError::Stopped { .. })));
}
