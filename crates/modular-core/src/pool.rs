//! 工厂池
//!
//! 核心内部的单例组件，持有按 `order` 排序的工厂列表，随核心启动和停止。

use crate::component::{Component, ComponentLifecycle, SingletonComponent};
use crate::app::AppCore;
use crate::errors::{CoreError, CoreResult, ShutdownFailure};
use crate::factory::ComponentFactory;
use crate::lifecycle::{ComponentBase, ComponentState};
use crate::ordered::{Ordered, OrderedList};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl Ordered for Arc<dyn ComponentFactory> {
    fn order_key(&self) -> u32 {
        self.order()
    }
}

pub(crate) struct FactoryPool {
    base: ComponentBase,
    factories: OrderedList<Arc<dyn ComponentFactory>>,
}

impl FactoryPool {
    pub(crate) fn new(factories: Vec<Arc<dyn ComponentFactory>>) -> Self {
        Self {
            base: ComponentBase::new(),
            factories: OrderedList::new(factories),
        }
    }

    /// 启动工厂池
    ///
    /// 物化工厂列表并依次启动每个工厂，任何工厂启动失败都会立即中止。
    pub(crate) fn start_all(&self, core: &Arc<AppCore>) -> CoreResult<()> {
        self.start(core)
            .map_err(|source| CoreError::FactoryStartFailed {
                factory: self.name().to_string(),
                source,
            })?;

        let factories = self.factories.materialize(|factories| {
            for factory in factories {
                debug!("启动工厂: {} (order={})", factory.name(), factory.order());
                factory
                    .start(core)
                    .map_err(|source| CoreError::FactoryStartFailed {
                        factory: factory.name().to_string(),
                        source,
                    })?;
            }
            Ok::<(), CoreError>(())
        })?;

        info!("工厂池已启动，共 {} 个工厂", factories.len());
        Ok(())
    }

    /// 停止工厂池
    ///
    /// 按列表顺序停止每个工厂，单个工厂失败不会中断其余工厂的停止。
    pub(crate) fn stop_all(&self) -> Vec<ShutdownFailure> {
        let mut failures = Vec::new();
        if self.state() != ComponentState::Started {
            return failures;
        }

        let result = self.base.stop_with(self.name(), || {
            for factory in self.factories.items() {
                if let Err(error) = factory.stop() {
                    warn!("工厂停止失败: {}, 原因: {}", factory.name(), error);
                    failures.push(ShutdownFailure::new(factory.name(), error));
                }
            }
            Ok(())
        });
        if let Err(error) = result {
            failures.push(ShutdownFailure::new(self.name(), error));
        }

        info!("工厂池已停止，失败 {} 个", failures.len());
        failures
    }

    /// 按解析顺序排列的工厂
    pub(crate) fn factories(&self) -> &[Arc<dyn ComponentFactory>] {
        self.factories.items()
    }

    pub(crate) fn len(&self) -> usize {
        self.factories.len()
    }
}

impl Component for FactoryPool {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn name(&self) -> &'static str {
        "FactoryPool"
    }
}

impl SingletonComponent for FactoryPool {}
