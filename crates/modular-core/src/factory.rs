//! 组件工厂抽象接口

use crate::component::{Component, ComponentLifecycle, SingletonComponent};
use crate::errors::{CoreError, CoreResult, HookError};
use crate::lifecycle::{ComponentBase, ComponentState};
use crate::metadata::{ComponentRequest, TypeInfo};
use crate::resolved::ResolvedComponent;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 组件工厂
///
/// 工厂本身是单例组件，由核心的工厂池持有并随核心启动和停止。
/// 核心按 `order` 升序询问每个工厂，第一个声明支持并返回实例的工厂胜出。
pub trait ComponentFactory: SingletonComponent {
    /// 排序键，值越小越先被询问
    fn order(&self) -> u32 {
        0
    }

    /// 是否愿意尝试创建请求的接口
    fn supports(&self, request: &ComponentRequest) -> bool;

    /// 创建实现请求接口的新组件
    ///
    /// 返回 `Ok(None)` 表示声明了支持但无法产出实例，核心会继续询问后续工厂。
    fn produce(&self, request: &ComponentRequest) -> Result<Option<ResolvedComponent>, HookError>;
}

/// 工厂的统一入口：校验请求并启动产出的组件
pub trait FactoryExt {
    fn is_supported(&self, request: &ComponentRequest) -> CoreResult<bool>;

    fn create(&self, request: &ComponentRequest) -> CoreResult<Option<ResolvedComponent>>;
}

impl<F: ?Sized + ComponentFactory> FactoryExt for F {
    fn is_supported(&self, request: &ComponentRequest) -> CoreResult<bool> {
        request.validate()?;
        Ok(self.supports(request))
    }

    fn create(&self, request: &ComponentRequest) -> CoreResult<Option<ResolvedComponent>> {
        request.validate()?;

        let produced = self
            .produce(request)
            .map_err(|source| CoreError::FactoryFailed {
                factory: self.name().to_string(),
                type_name: request.type_name().to_string(),
                source,
            })?;

        let Some(component) = produced else {
            debug!("工厂 {} 未能创建组件: {}", self.name(), request.type_name());
            return Ok(None);
        };

        if component.interface().id() != request.type_id() {
            return Err(CoreError::TypeMismatch {
                expected: request.type_name().to_string(),
                actual: component.interface().name().to_string(),
            });
        }

        if component.state() == ComponentState::None {
            if let Some(core) = self.core() {
                component
                    .start(&core)
                    .map_err(|source| CoreError::ComponentStartFailed {
                        type_name: request.type_name().to_string(),
                        source,
                    })?;
            }
        }

        Ok(Some(component))
    }
}

type Constructor = Arc<dyn Fn() -> Option<ResolvedComponent> + Send + Sync>;

/// 由构造闭包组成的工厂
///
/// ```rust
/// use modular_core::{ClosureFactory, Component, ComponentBase, MultipleComponent};
/// use std::sync::Arc;
///
/// trait Task: MultipleComponent {}
///
/// #[derive(Default)]
/// struct EchoTask {
///     base: ComponentBase,
/// }
///
/// impl Component for EchoTask {
///     fn base(&self) -> &ComponentBase {
///         &self.base
///     }
/// }
///
/// impl MultipleComponent for EchoTask {}
/// impl Task for EchoTask {}
///
/// let factory = ClosureFactory::new("tasks")
///     .with_order(10)
///     .provide::<dyn Task, _>(|| Some(Arc::new(EchoTask::default()) as Arc<dyn Task>));
/// assert_eq!(factory.provided().len(), 1);
/// ```
pub struct ClosureFactory {
    base: ComponentBase,
    name: &'static str,
    order: u32,
    constructors: Vec<(TypeInfo, Constructor)>,
}

impl ClosureFactory {
    pub fn new(name: &'static str) -> Self {
        Self {
            base: ComponentBase::new(),
            name,
            order: 0,
            constructors: Vec::new(),
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// 注册接口 `T` 的构造闭包
    pub fn provide<T, C>(mut self, constructor: C) -> Self
    where
        T: ?Sized + Component,
        C: Fn() -> Option<Arc<T>> + Send + Sync + 'static,
    {
        let constructor: Constructor =
            Arc::new(move || constructor().map(ResolvedComponent::new::<T>));
        self.constructors.push((TypeInfo::of::<T>(), constructor));
        self
    }

    /// 已注册的接口
    pub fn provided(&self) -> Vec<TypeInfo> {
        self.constructors.iter().map(|(info, _)| *info).collect()
    }

    fn constructor_for(&self, request: &ComponentRequest) -> Option<&Constructor> {
        self.constructors
            .iter()
            .find(|(info, _)| info.id() == request.type_id())
            .map(|(_, constructor)| constructor)
    }
}

impl Component for ClosureFactory {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

impl SingletonComponent for ClosureFactory {}

impl ComponentFactory for ClosureFactory {
    fn order(&self) -> u32 {
        self.order
    }

    fn supports(&self, request: &ComponentRequest) -> bool {
        self.constructor_for(request).is_some()
    }

    fn produce(&self, request: &ComponentRequest) -> Result<Option<ResolvedComponent>, HookError> {
        Ok(self.constructor_for(request).and_then(|constructor| constructor()))
    }
}

impl fmt::Debug for ClosureFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureFactory")
            .field("name", &self.name)
            .field("order", &self.order)
            .field(
                "provided",
                &self
                    .constructors
                    .iter()
                    .map(|(info, _)| info.name())
                    .collect::<Vec<_>>(),
            )
            .field("state", &self.state())
            .finish()
    }
}
