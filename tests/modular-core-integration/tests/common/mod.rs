//! 集成测试共用的组件与工厂
#![allow(dead_code)]

use modular_core::{
    AppCore, Component, ComponentBase, ComponentFactory, ComponentRequest, HookError, HookResult,
    MultipleComponent, ResolvedComponent, SingletonComponent,
};
use parking_lot::Mutex;
use std::any::TypeId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 生命周期事件记录
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().clone()
}

pub fn count(log: &EventLog, event: &str) -> usize {
    log.lock().iter().filter(|entry| entry.as_str() == event).count()
}

pub trait Foo: SingletonComponent {
    fn label(&self) -> String;
}

pub trait Bar: SingletonComponent {
    fn label(&self) -> String;
}

pub trait Widget: MultipleComponent {
    fn serial(&self) -> usize;
}

static SERIAL: AtomicUsize = AtomicUsize::new(0);

/// 记录生命周期事件的组件
pub struct Tracked {
    base: ComponentBase,
    label: String,
    serial: usize,
    log: EventLog,
    fail_start: bool,
    fail_stop: bool,
}

impl Tracked {
    pub fn new(label: &str, log: &EventLog) -> Self {
        Self {
            base: ComponentBase::new(),
            label: label.to_string(),
            serial: SERIAL.fetch_add(1, Ordering::SeqCst),
            log: Arc::clone(log),
            fail_start: false,
            fail_stop: false,
        }
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }
}

impl Component for Tracked {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn on_start(&self, _core: &Arc<AppCore>) -> HookResult {
        self.log.lock().push(format!("start {}", self.label));
        if self.fail_start {
            return Err(format!("{} 启动失败", self.label).into());
        }
        Ok(())
    }

    fn on_stop(&self) -> HookResult {
        self.log.lock().push(format!("stop {}", self.label));
        if self.fail_stop {
            return Err(format!("{} 停止失败", self.label).into());
        }
        Ok(())
    }
}

impl SingletonComponent for Tracked {}
impl MultipleComponent for Tracked {}

impl Foo for Tracked {
    fn label(&self) -> String {
        self.label.clone()
    }
}

impl Bar for Tracked {
    fn label(&self) -> String {
        self.label.clone()
    }
}

impl Widget for Tracked {
    fn serial(&self) -> usize {
        self.serial
    }
}

/// 可以由类型目录无参构造的 `Foo` 实现
#[derive(Default)]
pub struct FooImpl {
    base: ComponentBase,
}

impl Component for FooImpl {
    fn base(&self) -> &ComponentBase {
        &self.base
    }
}

impl SingletonComponent for FooImpl {}

impl Foo for FooImpl {
    fn label(&self) -> String {
        "FooImpl".to_string()
    }
}

pub fn foo(tracked: Tracked) -> ResolvedComponent {
    ResolvedComponent::new::<dyn Foo>(Arc::new(tracked))
}

pub fn bar(tracked: Tracked) -> ResolvedComponent {
    ResolvedComponent::new::<dyn Bar>(Arc::new(tracked))
}

pub fn widget(tracked: Tracked) -> ResolvedComponent {
    ResolvedComponent::new::<dyn Widget>(Arc::new(tracked))
}

type Producer = Box<dyn Fn(&ComponentRequest) -> Option<ResolvedComponent> + Send + Sync>;

/// 按脚本声明支持并产出组件的工厂
pub struct ScriptedFactory {
    base: ComponentBase,
    label: &'static str,
    order: u32,
    log: EventLog,
    supported: Vec<TypeId>,
    producer: Producer,
    produced: AtomicUsize,
    delay: Option<Duration>,
    fail_start: bool,
    fail_stop: bool,
}

impl ScriptedFactory {
    pub fn new(label: &'static str, order: u32, log: &EventLog) -> Self {
        Self {
            base: ComponentBase::new(),
            label,
            order,
            log: Arc::clone(log),
            supported: Vec::new(),
            producer: Box::new(|_: &ComponentRequest| None),
            produced: AtomicUsize::new(0),
            delay: None,
            fail_start: false,
            fail_stop: false,
        }
    }

    pub fn supporting<T: ?Sized + 'static>(mut self) -> Self {
        self.supported.push(TypeId::of::<T>());
        self
    }

    pub fn producing<P>(mut self, producer: P) -> Self
    where
        P: Fn(&ComponentRequest) -> Option<ResolvedComponent> + Send + Sync + 'static,
    {
        self.producer = Box::new(producer);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    /// `produce` 被调用的次数
    pub fn produced(&self) -> usize {
        self.produced.load(Ordering::SeqCst)
    }
}

impl Component for ScriptedFactory {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn name(&self) -> &'static str {
        self.label
    }

    fn on_start(&self, _core: &Arc<AppCore>) -> HookResult {
        self.log.lock().push(format!("start {}", self.label));
        if self.fail_start {
            return Err(format!("{} 启动失败", self.label).into());
        }
        Ok(())
    }

    fn on_stop(&self) -> HookResult {
        self.log.lock().push(format!("stop {}", self.label));
        if self.fail_stop {
            return Err(format!("{} 停止失败", self.label).into());
        }
        Ok(())
    }
}

impl SingletonComponent for ScriptedFactory {}

impl ComponentFactory for ScriptedFactory {
    fn order(&self) -> u32 {
        self.order
    }

    fn supports(&self, request: &ComponentRequest) -> bool {
        self.supported.contains(&request.type_id())
    }

    fn produce(&self, request: &ComponentRequest) -> Result<Option<ResolvedComponent>, HookError> {
        self.produced.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        Ok((self.producer)(request))
    }
}
