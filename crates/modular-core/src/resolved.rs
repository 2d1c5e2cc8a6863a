//! 类型擦除后的已解析组件

use crate::component::{Component, ComponentLifecycle};
use crate::app::{AppCore, CoreId};
use crate::errors::LifecycleResult;
use crate::lifecycle::ComponentState;
use crate::metadata::TypeInfo;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 不依赖具体接口类型的生命周期句柄
pub(crate) trait ErasedLifecycle: Send + Sync {
    fn component_name(&self) -> &'static str;
    fn current_state(&self) -> ComponentState;
    fn start_erased(&self, core: &Arc<AppCore>) -> LifecycleResult<()>;
    fn stop_erased(&self) -> LifecycleResult<()>;
    fn owner(&self) -> Option<CoreId>;
}

impl<T: ?Sized + Component> ErasedLifecycle for Arc<T> {
    fn component_name(&self) -> &'static str {
        Component::name(&**self)
    }

    fn current_state(&self) -> ComponentState {
        ComponentLifecycle::state(&**self)
    }

    fn start_erased(&self, core: &Arc<AppCore>) -> LifecycleResult<()> {
        ComponentLifecycle::start(&**self, core)
    }

    fn stop_erased(&self) -> LifecycleResult<()> {
        ComponentLifecycle::stop(&**self)
    }

    fn owner(&self) -> Option<CoreId> {
        ComponentLifecycle::owner_id(&**self)
    }
}

/// 工厂产出的组件
///
/// 内部保存 `Arc<T>`，其中 `T` 是请求的接口类型。
pub struct ResolvedComponent {
    interface: TypeInfo,
    instance: Box<dyn Any + Send + Sync>,
    lifecycle: Box<dyn ErasedLifecycle>,
}

impl ResolvedComponent {
    /// 包装一个实现了接口 `T` 的组件
    pub fn new<T: ?Sized + Component>(instance: Arc<T>) -> Self {
        Self {
            interface: TypeInfo::of::<T>(),
            lifecycle: Box::new(Arc::clone(&instance)),
            instance: Box::new(instance),
        }
    }

    /// 组件实现的接口
    pub fn interface(&self) -> &TypeInfo {
        &self.interface
    }

    /// 具体组件名称
    pub fn component_name(&self) -> &'static str {
        self.lifecycle.component_name()
    }

    pub fn state(&self) -> ComponentState {
        self.lifecycle.current_state()
    }

    pub fn owner_id(&self) -> Option<CoreId> {
        self.lifecycle.owner()
    }

    /// 是否以接口 `T` 包装
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.interface.is::<T>()
    }

    pub fn downcast_ref<T: ?Sized + Component>(&self) -> Option<&Arc<T>> {
        self.instance.downcast_ref::<Arc<T>>()
    }

    /// 取出接口 `T` 的实例，类型不符时原样返回
    pub fn downcast<T: ?Sized + Component>(self) -> Result<Arc<T>, Self> {
        match self.instance.downcast::<Arc<T>>() {
            Ok(instance) => Ok(*instance),
            Err(instance) => Err(Self {
                interface: self.interface,
                instance,
                lifecycle: self.lifecycle,
            }),
        }
    }

    pub(crate) fn start(&self, core: &Arc<AppCore>) -> LifecycleResult<()> {
        self.lifecycle.start_erased(core)
    }

    pub(crate) fn stop(&self) -> LifecycleResult<()> {
        self.lifecycle.stop_erased()
    }
}

impl fmt::Debug for ResolvedComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedComponent")
            .field("interface", &self.interface.name())
            .field("component", &self.component_name())
            .field("state", &self.state())
            .finish()
    }
}

/// 缓存单例的停止句柄
pub(crate) struct ShutdownHandle {
    lifecycle: Box<dyn ErasedLifecycle>,
}

impl ShutdownHandle {
    pub(crate) fn new<T: ?Sized + Component>(instance: &Arc<T>) -> Self {
        Self {
            lifecycle: Box::new(Arc::clone(instance)),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.lifecycle.component_name()
    }

    pub(crate) fn stop(&self) -> LifecycleResult<()> {
        self.lifecycle.stop_erased()
    }
}
