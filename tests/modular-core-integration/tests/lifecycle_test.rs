//! 核心与组件生命周期的集成测试

mod common;

use common::*;
use modular_core::{
    AppCore, ComponentLifecycle, ComponentState, CoreError, CoreHooks, CoreStatus, HookResult,
    LifecycleError,
};
use std::sync::Arc;

fn tracked_factory(label: &'static str, order: u32, log: &EventLog) -> ScriptedFactory {
    let produced_log = Arc::clone(log);
    ScriptedFactory::new(label, order, log)
        .supporting::<dyn Foo>()
        .supporting::<dyn Bar>()
        .producing(move |request| {
            if request.is::<dyn Foo>() {
                Some(foo(Tracked::new("foo", &produced_log)))
            } else {
                Some(bar(Tracked::new("bar", &produced_log)))
            }
        })
}

fn core_with(factories: Vec<ScriptedFactory>) -> Arc<AppCore> {
    factories
        .into_iter()
        .fold(AppCore::builder().with_default_factory(false), |builder, factory| {
            builder.with_factory(factory)
        })
        .build()
}

#[test]
fn test_start_twice_is_rejected() -> anyhow::Result<()> {
    let log = event_log();
    let core = core_with(vec![tracked_factory("trackers", 1, &log)]);

    assert_eq!(core.status(), CoreStatus::Created);
    core.start()?;
    assert_eq!(core.status(), CoreStatus::Running);
    assert!(core.metrics().started_at.is_some());

    assert!(matches!(core.start(), Err(CoreError::AlreadyStarted { .. })));
    assert_eq!(count(&log, "start trackers"), 1);
    Ok(())
}

#[test]
fn test_operations_require_running_core() -> anyhow::Result<()> {
    let log = event_log();
    let core = core_with(vec![tracked_factory("trackers", 1, &log)]);

    assert!(matches!(core.get::<dyn Foo>(), Err(CoreError::NotStarted { .. })));
    assert!(matches!(core.create::<dyn Widget>(), Err(CoreError::NotStarted { .. })));
    assert!(matches!(core.stop(), Err(CoreError::NotStarted { .. })));

    core.start()?;
    core.stop()?;

    assert!(matches!(core.get::<dyn Foo>(), Err(CoreError::Stopped { .. })));
    assert!(matches!(core.create::<dyn Widget>(), Err(CoreError::Stopped { .. })));
    assert!(matches!(core.start(), Err(CoreError::Stopped { .. })));
    Ok(())
}

#[test]
fn test_stop_is_idempotent() -> anyhow::Result<()> {
    let log = event_log();
    let core = core_with(vec![tracked_factory("trackers", 1, &log)]);
    core.start()?;
    let resolved = core.get::<dyn Foo>()?.expect("应当解析到 Foo");

    core.stop()?;
    core.stop()?;

    assert_eq!(core.status(), CoreStatus::Stopped);
    assert!(core.metrics().stopped_at.is_some());
    assert_eq!(resolved.state(), ComponentState::Stopped);
    assert_eq!(count(&log, "stop foo"), 1);
    assert_eq!(count(&log, "stop trackers"), 1);
    Ok(())
}

#[test]
fn test_singletons_stop_in_reverse_order_before_factories() -> anyhow::Result<()> {
    let log = event_log();
    let core = core_with(vec![
        tracked_factory("late-factory", 20, &log),
        tracked_factory("early-factory", 10, &log),
    ]);
    core.start()?;
    core.get::<dyn Foo>()?;
    core.get::<dyn Bar>()?;
    assert_eq!(core.metrics().cached_singletons, 2);

    log.lock().clear();
    core.stop()?;

    assert_eq!(
        events(&log),
        vec!["stop bar", "stop foo", "stop early-factory", "stop late-factory"]
    );
    assert_eq!(core.metrics().cached_singletons, 0);
    Ok(())
}

#[test]
fn test_shutdown_failures_are_aggregated() -> anyhow::Result<()> {
    let log = event_log();
    let produced_log = Arc::clone(&log);
    let core = core_with(vec![
        ScriptedFactory::new("fragile", 1, &log)
            .supporting::<dyn Foo>()
            .producing(move |_| Some(foo(Tracked::new("foo", &produced_log).failing_stop())))
            .failing_stop(),
        tracked_factory("steady", 2, &log),
    ]);
    core.start()?;
    core.get::<dyn Foo>()?;

    match core.stop() {
        Err(CoreError::ShutdownFailed { failures }) => {
            assert_eq!(failures.len(), 2);
            assert!(failures[0].component.ends_with("Tracked"));
            assert_eq!(failures[1].component, "fragile");
        }
        other => panic!("应当汇总停止失败: {:?}", other),
    }

    // 失败的组件同样完成了停止，其余工厂照常停止
    assert_eq!(core.status(), CoreStatus::Stopped);
    assert_eq!(count(&log, "stop steady"), 1);
    core.stop()?;
    assert_eq!(count(&log, "stop fragile"), 1);
    assert_eq!(count(&log, "stop foo"), 1);
    Ok(())
}

#[test]
fn test_factory_start_failure_aborts_core() {
    let log = event_log();
    let core = core_with(vec![
        tracked_factory("healthy", 1, &log),
        tracked_factory("broken", 2, &log).failing_start(),
        tracked_factory("never", 3, &log),
    ]);

    match core.start() {
        Err(CoreError::FactoryStartFailed { factory, source }) => {
            assert_eq!(factory, "broken");
            assert!(matches!(source, LifecycleError::HookFailed { .. }));
        }
        other => panic!("应当返回工厂启动失败: {:?}", other),
    }

    assert_eq!(core.status(), CoreStatus::Failed);
    assert!(matches!(core.start(), Err(CoreError::StartAborted { .. })));
    assert!(matches!(core.get::<dyn Foo>(), Err(CoreError::NotStarted { .. })));
    assert_eq!(count(&log, "start never"), 0);

    // 释放失败的核心时停止已经启动的工厂
    drop(core);
    assert_eq!(count(&log, "stop healthy"), 1);
    assert_eq!(count(&log, "stop broken"), 1);
    assert_eq!(count(&log, "stop never"), 0);
}

struct RecordingHooks {
    log: EventLog,
    fail_start: bool,
}

impl CoreHooks for RecordingHooks {
    fn on_start(&self, core: &Arc<AppCore>) -> HookResult {
        self.log.lock().push(format!("core start {}", core.name()));
        if self.fail_start {
            return Err("核心启动钩子失败".into());
        }
        Ok(())
    }

    fn on_stop(&self, core: &AppCore) -> HookResult {
        self.log.lock().push(format!("core stop {}", core.name()));
        Ok(())
    }
}

#[test]
fn test_core_hooks_wrap_factory_lifecycle() -> anyhow::Result<()> {
    let log = event_log();
    let core = AppCore::builder()
        .with_name("orders")
        .with_default_factory(false)
        .with_factory(tracked_factory("trackers", 1, &log))
        .with_hooks(RecordingHooks {
            log: Arc::clone(&log),
            fail_start: false,
        })
        .build();

    core.start()?;
    core.get::<dyn Foo>()?;
    core.stop()?;

    assert_eq!(
        events(&log),
        vec![
            "start trackers",
            "core start orders",
            "start foo",
            "core stop orders",
            "stop foo",
            "stop trackers",
        ]
    );
    Ok(())
}

#[test]
fn test_startup_hook_failure_marks_core_failed() {
    let log = event_log();
    let core = AppCore::builder()
        .with_default_factory(false)
        .with_factory(tracked_factory("trackers", 1, &log))
        .with_hooks(RecordingHooks {
            log: Arc::clone(&log),
            fail_start: true,
        })
        .build();

    assert!(matches!(core.start(), Err(CoreError::StartupHookFailed { .. })));
    assert_eq!(core.status(), CoreStatus::Failed);
    assert!(!core.is_started());

    drop(core);
    assert_eq!(count(&log, "stop trackers"), 1);
}

#[test]
fn test_component_start_failure_is_reported() -> anyhow::Result<()> {
    let log = event_log();
    let produced_log = Arc::clone(&log);
    let core = core_with(vec![ScriptedFactory::new("fragile", 1, &log)
        .supporting::<dyn Foo>()
        .producing(move |_| Some(foo(Tracked::new("foo", &produced_log).failing_start())))]);
    core.start()?;

    assert!(matches!(
        core.get::<dyn Foo>(),
        Err(CoreError::ComponentStartFailed { .. })
    ));
    assert_eq!(core.metrics().cached_singletons, 0);
    Ok(())
}

#[test]
fn test_attach_starts_owned_component() -> anyhow::Result<()> {
    let log = event_log();
    let core = core_with(vec![]);
    core.start()?;

    let tracked = Tracked::new("attached", &log);
    tracked.declare_owner(&core)?;
    core.attach(&tracked)?;

    assert_eq!(tracked.state(), ComponentState::Started);
    assert_eq!(tracked.owner_id(), Some(core.id()));
    assert!(tracked.core().is_some_and(|owner| Arc::ptr_eq(&owner, &core)));

    // 已启动的组件再次附加不会重复执行钩子
    assert!(core.try_attach(&tracked));
    assert_eq!(count(&log, "start attached"), 1);
    Ok(())
}

#[test]
fn test_attach_rejects_foreign_or_unowned_component() -> anyhow::Result<()> {
    let log = event_log();
    let core = core_with(vec![]);
    let other = core_with(vec![]);
    core.start()?;
    other.start()?;

    let unowned = Tracked::new("unowned", &log);
    assert!(matches!(core.attach(&unowned), Err(CoreError::OwnershipConflict { .. })));
    assert!(!core.try_attach(&unowned));
    assert_eq!(unowned.state(), ComponentState::None);

    let foreign = Tracked::new("foreign", &log);
    foreign.declare_owner(&other)?;
    assert!(matches!(
        foreign.declare_owner(&core),
        Err(LifecycleError::OwnerMismatch { .. })
    ));
    assert!(!core.try_attach(&foreign));
    assert_eq!(foreign.state(), ComponentState::None);
    assert_eq!(count(&log, "start foreign"), 0);
    Ok(())
}

#[test]
fn test_try_attach_reports_start_failure_as_attached() -> anyhow::Result<()> {
    let log = event_log();
    let core = core_with(vec![]);
    core.start()?;

    let tracked = Tracked::new("fragile", &log).failing_start();
    tracked.declare_owner(&core)?;

    assert!(core.try_attach(&tracked));
    assert_eq!(tracked.state(), ComponentState::Started);
    assert_eq!(count(&log, "start fragile"), 1);
    Ok(())
}

#[test]
fn test_component_stop_hook_runs_once() -> anyhow::Result<()> {
    let log = event_log();
    let core = core_with(vec![]);
    core.start()?;

    let tracked = Tracked::new("failing", &log).failing_stop();
    tracked.declare_owner(&core)?;
    core.attach(&tracked)?;

    assert!(matches!(tracked.stop(), Err(LifecycleError::HookFailed { .. })));
    assert_eq!(tracked.state(), ComponentState::Stopped);
    tracked.stop()?;
    assert_eq!(count(&log, "stop failing"), 1);

    assert!(matches!(tracked.start(&core), Err(LifecycleError::AlreadyStopped { .. })));
    Ok(())
}

#[test]
fn test_dropping_core_stops_it() -> anyhow::Result<()> {
    let log = event_log();
    let core = core_with(vec![tracked_factory("trackers", 1, &log)]);
    core.start()?;
    let resolved = core.get::<dyn Foo>()?.expect("应当解析到 Foo");
    assert!(resolved.core().is_some());

    drop(core);

    assert_eq!(resolved.state(), ComponentState::Stopped);
    assert!(resolved.core().is_none());
    assert_eq!(count(&log, "stop foo"), 1);
    assert_eq!(count(&log, "stop trackers"), 1);
    Ok(())
}
