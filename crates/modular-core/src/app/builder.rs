//! 核心构建器

use super::hooks::{CoreHooks, NoopHooks};
use super::AppCore;
use crate::default_factory::DefaultComponentFactory;
use crate::discovery::{TypeCatalog, TypeDiscovery};
use crate::factory::ComponentFactory;
use std::sync::Arc;
use tracing::debug;

/// 核心构建器
///
/// 工厂的注册顺序决定相同 `order` 时的询问顺序。
pub struct AppCoreBuilder {
    name: String,
    factories: Vec<Arc<dyn ComponentFactory>>,
    hooks: Box<dyn CoreHooks>,
    discovery: Option<Arc<dyn TypeDiscovery>>,
    default_factory: bool,
}

impl AppCoreBuilder {
    pub fn new() -> Self {
        Self {
            name: "app-core".to_string(),
            factories: Vec::new(),
            hooks: Box::new(NoopHooks),
            discovery: None,
            default_factory: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 注册工厂
    pub fn with_factory<F: ComponentFactory>(self, factory: F) -> Self {
        self.with_shared_factory(Arc::new(factory))
    }

    /// 注册已共享的工厂，调用方可以保留引用以便观察其状态
    pub fn with_shared_factory(mut self, factory: Arc<dyn ComponentFactory>) -> Self {
        debug!("注册工厂: {} (order={})", factory.name(), factory.order());
        self.factories.push(factory);
        self
    }

    pub fn with_hooks<H: CoreHooks>(mut self, hooks: H) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// 默认工厂使用的类型发现
    pub fn with_discovery(mut self, discovery: Arc<dyn TypeDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// 是否安装默认工厂，默认安装
    pub fn with_default_factory(mut self, enabled: bool) -> Self {
        self.default_factory = enabled;
        self
    }

    pub fn build(mut self) -> Arc<AppCore> {
        if self.default_factory {
            let discovery = self
                .discovery
                .take()
                .unwrap_or_else(|| Arc::new(TypeCatalog::new()));
            self.factories
                .push(Arc::new(DefaultComponentFactory::new(discovery)));
        }

        Arc::new(AppCore::new(self.name, self.factories, self.hooks))
    }
}

impl Default for AppCoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
