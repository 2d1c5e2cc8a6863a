//! 默认组件工厂
//!
//! 优先级最低的兜底工厂：在类型目录中查找提供请求接口、并且可以无参构造的具体类型。

use crate::component::{Component, SingletonComponent};
use crate::discovery::{InterfaceBinding, TypeCatalog, TypeDiscovery};
use crate::errors::HookError;
use crate::factory::ComponentFactory;
use crate::lifecycle::ComponentBase;
use crate::metadata::ComponentRequest;
use crate::resolved::ResolvedComponent;
use dashmap::DashMap;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub struct DefaultComponentFactory {
    base: ComponentBase,
    discovery: Arc<dyn TypeDiscovery>,
    supported: DashMap<TypeId, InterfaceBinding>,
}

impl DefaultComponentFactory {
    pub fn new(discovery: Arc<dyn TypeDiscovery>) -> Self {
        Self {
            base: ComponentBase::new(),
            discovery,
            supported: DashMap::new(),
        }
    }

    /// 已缓存匹配结果的接口数量
    pub fn cached_bindings(&self) -> usize {
        self.supported.len()
    }

    fn binding_for(&self, request: &ComponentRequest) -> Option<InterfaceBinding> {
        if let Some(binding) = self.supported.get(&request.type_id()) {
            return Some(binding.value().clone());
        }

        let found = self
            .discovery
            .enumerate()
            .iter()
            .find_map(|candidate| candidate.binding_for(request.type_id()).cloned())?;

        debug!(
            "默认工厂匹配: {} -> {}",
            request.type_name(),
            found.concrete().name()
        );
        Some(
            self.supported
                .entry(request.type_id())
                .or_insert(found)
                .value()
                .clone(),
        )
    }
}

impl Default for DefaultComponentFactory {
    fn default() -> Self {
        Self::new(Arc::new(TypeCatalog::new()))
    }
}

impl Component for DefaultComponentFactory {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn name(&self) -> &'static str {
        "DefaultComponentFactory"
    }
}

impl SingletonComponent for DefaultComponentFactory {}

impl ComponentFactory for DefaultComponentFactory {
    fn order(&self) -> u32 {
        u32::MAX
    }

    fn supports(&self, request: &ComponentRequest) -> bool {
        self.binding_for(request).is_some()
    }

    fn produce(&self, request: &ComponentRequest) -> Result<Option<ResolvedComponent>, HookError> {
        Ok(self.binding_for(request).map(|binding| binding.construct()))
    }
}

impl fmt::Debug for DefaultComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultComponentFactory")
            .field("cached_bindings", &self.cached_bindings())
            .finish()
    }
}
