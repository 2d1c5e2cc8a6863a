//! 运行时启动器
//!
//! 负责初始化日志、根据配置组装核心、启动核心并立即解析启动清单中的组件。

use crate::errors::{CompositionError, CompositionResult};
use crate::logging::initialize_logging;
use crate::settings::RuntimeConfig;
use modular_core::{
    AppCore, AppCoreBuilder, CandidateType, ComponentFactory, CoreHooks, CoreResult,
    SingletonComponent, TypeCatalog, TypeInfo,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

type Resolver = Box<dyn Fn(&Arc<AppCore>) -> CoreResult<bool> + Send + Sync>;

/// 可以出现在启动清单中的单例接口
struct ImmediateComponent {
    interface: TypeInfo,
    resolve: Resolver,
}

impl ImmediateComponent {
    /// 名称可以是短名称 `Clock`，也可以是带模块路径的完整名称
    fn matches(&self, name: &str) -> bool {
        let full = self.interface.name();
        name == self.interface.short_name()
            || name == full
            || full.strip_prefix("dyn ").is_some_and(|path| path == name)
    }
}

/// 运行时启动器
pub struct RuntimeBootstrapper {
    config: RuntimeConfig,
    builder: AppCoreBuilder,
    candidates: Vec<CandidateType>,
    immediate: Vec<ImmediateComponent>,
    logging_enabled: bool,
}

impl RuntimeBootstrapper {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            builder: AppCoreBuilder::new(),
            candidates: Vec::new(),
            immediate: Vec::new(),
            logging_enabled: false,
        }
    }

    /// 从配置文件创建启动器
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> CompositionResult<Self> {
        Ok(Self::new(RuntimeConfig::from_file(path)?))
    }

    /// 是否由启动器安装全局日志订阅者，默认不安装
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    pub fn with_factory<F: ComponentFactory>(mut self, factory: F) -> Self {
        self.builder = self.builder.with_factory(factory);
        self
    }

    pub fn with_shared_factory(mut self, factory: Arc<dyn ComponentFactory>) -> Self {
        self.builder = self.builder.with_shared_factory(factory);
        self
    }

    pub fn with_hooks<H: CoreHooks>(mut self, hooks: H) -> Self {
        self.builder = self.builder.with_hooks(hooks);
        self
    }

    /// 向默认工厂的类型目录登记候选类型
    pub fn register_type(mut self, candidate: impl Into<CandidateType>) -> Self {
        self.candidates.push(candidate.into());
        self
    }

    /// 允许启动清单引用单例接口 `T`
    pub fn register_immediate<T: ?Sized + SingletonComponent>(mut self) -> Self {
        self.immediate.push(ImmediateComponent {
            interface: TypeInfo::of::<T>(),
            resolve: Box::new(|core: &Arc<AppCore>| -> CoreResult<bool> {
                Ok(core.get::<T>()?.is_some())
            }),
        });
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// 启动运行时
    pub fn bootstrap(self) -> CompositionResult<Runtime> {
        if self.logging_enabled {
            initialize_logging(&self.config.logging)?;
        }
        info!("开始启动运行时: {}", self.config.name);

        // 先校验启动清单，避免启动后才发现未知名称
        let mut eager = Vec::with_capacity(self.config.startup.immediate.len());
        for name in &self.config.startup.immediate {
            let entry = self
                .immediate
                .iter()
                .find(|entry| entry.matches(name))
                .ok_or_else(|| CompositionError::UnknownImmediateComponent { name: name.clone() })?;
            eager.push((name.as_str(), entry));
        }

        let catalog = TypeCatalog::with_options(self.config.discovery.options())?;
        for candidate in self.candidates {
            catalog.register(candidate);
        }
        debug!("类型目录已就绪，共 {} 个候选类型", catalog.len());

        let core = self
            .builder
            .with_name(self.config.name.clone())
            .with_discovery(Arc::new(catalog))
            .with_default_factory(self.config.discovery.enabled)
            .build();
        core.start()?;

        for (name, entry) in eager {
            let resolved = match (entry.resolve)(&core) {
                Ok(resolved) => resolved,
                Err(error) => {
                    Self::abort(&core);
                    return Err(error.into());
                }
            };
            if !resolved {
                Self::abort(&core);
                return Err(CompositionError::ImmediateComponentMissing {
                    name: name.to_string(),
                });
            }
            debug!("立即启动组件已解析: {}", name);
        }

        info!("运行时启动完成: {}", self.config.name);
        Ok(Runtime {
            core,
            config: self.config,
        })
    }

    fn abort(core: &Arc<AppCore>) {
        if let Err(error) = core.stop() {
            warn!("启动失败后停止核心出错: {}", error);
        }
    }
}

impl fmt::Debug for RuntimeBootstrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeBootstrapper")
            .field("config", &self.config)
            .field("candidates", &self.candidates.len())
            .field(
                "immediate",
                &self
                    .immediate
                    .iter()
                    .map(|entry| entry.interface.short_name())
                    .collect::<Vec<_>>(),
            )
            .field("logging_enabled", &self.logging_enabled)
            .finish()
    }
}

/// 已启动的运行时
#[derive(Debug)]
pub struct Runtime {
    core: Arc<AppCore>,
    config: RuntimeConfig,
}

impl Runtime {
    pub fn core(&self) -> &Arc<AppCore> {
        &self.core
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// 停止核心
    pub fn shutdown(self) -> CompositionResult<()> {
        info!("关闭运行时: {}", self.config.name);
        self.core.stop()?;
        Ok(())
    }
}
