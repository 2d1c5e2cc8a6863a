//! # 演示应用程序
//!
//! 演示如何通过运行时启动器组装核心、解析单例组件和创建多实例组件

use chrono::Utc;
use clap::Parser;
use modular_composition::{RuntimeBootstrapper, RuntimeConfig};
use modular_core::{
    AppCore, CandidateType, ClosureFactory, Component, ComponentBase, ComponentLifecycle,
    HookResult, MultipleComponent, SingletonComponent,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "demo-app")]
#[command(about = "模块化组件运行时演示应用")]
struct Args {
    /// 配置文件路径，不指定时只读取环境变量
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 创建的问候组件数量
    #[arg(long, default_value_t = 3)]
    greeters: usize,

    /// 问候的对象
    #[arg(long, default_value = "world")]
    name: String,
}

/// 时钟单例
trait Clock: SingletonComponent {
    /// 当前 Unix 时间戳，单位秒
    fn now(&self) -> i64;
}

#[derive(Default)]
struct SystemClock {
    base: ComponentBase,
}

impl Component for SystemClock {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn on_start(&self, core: &Arc<AppCore>) -> HookResult {
        info!("时钟已启动，所属核心: {}", core.name());
        Ok(())
    }
}

impl SingletonComponent for SystemClock {}

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// 问候组件，每次创建都是新实例
trait Greeter: MultipleComponent {
    fn greet(&self, name: &str) -> String;
}

static GREETER_SERIAL: AtomicUsize = AtomicUsize::new(0);

struct ConsoleGreeter {
    base: ComponentBase,
    serial: usize,
}

impl Default for ConsoleGreeter {
    fn default() -> Self {
        Self {
            base: ComponentBase::new(),
            serial: GREETER_SERIAL.fetch_add(1, Ordering::SeqCst),
        }
    }
}

impl Component for ConsoleGreeter {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn on_stop(&self) -> HookResult {
        info!("问候组件 #{} 已停止", self.serial);
        Ok(())
    }
}

impl MultipleComponent for ConsoleGreeter {}

impl Greeter for ConsoleGreeter {
    fn greet(&self, name: &str) -> String {
        format!("[#{}] 你好, {}!", self.serial, name)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RuntimeConfig::from_file(path)?,
        None => RuntimeConfig::load()?,
    };

    let runtime = RuntimeBootstrapper::new(config)
        .with_logging(true)
        .with_factory(
            ClosureFactory::new("clocks")
                .with_order(10)
                .provide::<dyn Clock, _>(|| Some(Arc::new(SystemClock::default()) as Arc<dyn Clock>)),
        )
        .register_type(
            CandidateType::of::<ConsoleGreeter>()
                .provides::<dyn Greeter>(|greeter| greeter as Arc<dyn Greeter>),
        )
        .register_immediate::<dyn Clock>()
        .bootstrap()?;

    info!("启动演示应用: {}", runtime.config().name);
    let core = runtime.core();

    if let Some(clock) = core.get::<dyn Clock>()? {
        info!("当前时间戳: {}", clock.now());
    }

    let mut greeters = Vec::with_capacity(args.greeters);
    for _ in 0..args.greeters {
        if let Some(greeter) = core.create::<dyn Greeter>()? {
            println!("{}", greeter.greet(&args.name));
            greeters.push(greeter);
        }
    }

    println!("{}", serde_json::to_string_pretty(&core.metrics())?);

    runtime.shutdown()?;

    // 多实例组件由调用方负责停止
    for greeter in &greeters {
        greeter.stop()?;
    }

    info!("演示应用已退出");
    Ok(())
}
