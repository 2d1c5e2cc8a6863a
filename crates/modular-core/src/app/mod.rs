//! 应用核心
//!
//! [`AppCore`] 持有工厂池和单例缓存，对外提供组件的解析、创建和附加。

mod builder;
mod cache;
mod hooks;
mod resolution;
mod status;

pub use builder::AppCoreBuilder;
pub use hooks::{CoreHooks, NoopHooks};
pub use status::{CoreId, CoreMetrics, CoreStatus};

use crate::component::{Component, ComponentLifecycle, MultipleComponent, SingletonComponent};
use crate::errors::{CoreError, CoreResult, ShutdownFailure};
use crate::factory::{ComponentFactory, FactoryExt};
use crate::lifecycle::ComponentState;
use crate::metadata::ComponentRequest;
use crate::pool::FactoryPool;
use crate::resolved::ResolvedComponent;
use cache::{CachedSingleton, SingletonCache};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use resolution::ResolutionGuard;
use status::MetricsRecorder;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 单例解析的中间结果，未命中不会写入缓存
enum Resolution {
    Miss,
    Failed(CoreError),
}

impl From<CoreError> for Resolution {
    fn from(error: CoreError) -> Self {
        Self::Failed(error)
    }
}

/// 运行时核心
pub struct AppCore {
    id: CoreId,
    name: String,
    hooks: Box<dyn CoreHooks>,
    pending_factories: Mutex<Vec<Arc<dyn ComponentFactory>>>,
    pool: OnceCell<FactoryPool>,
    singletons: OnceCell<SingletonCache>,
    lifecycle: Mutex<()>,
    /// 解析期间持有读锁，停止时持有写锁
    resolving: RwLock<()>,
    started: AtomicBool,
    stopped: AtomicBool,
    failed: AtomicBool,
    metrics: MetricsRecorder,
}

impl AppCore {
    pub(crate) fn new(
        name: String,
        factories: Vec<Arc<dyn ComponentFactory>>,
        hooks: Box<dyn CoreHooks>,
    ) -> Self {
        Self {
            id: CoreId::new(),
            name,
            hooks,
            pending_factories: Mutex::new(factories),
            pool: OnceCell::new(),
            singletons: OnceCell::new(),
            lifecycle: Mutex::new(()),
            resolving: RwLock::new(()),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            failed: AtomicBool::new(false),
            metrics: MetricsRecorder::default(),
        }
    }

    pub fn builder() -> AppCoreBuilder {
        AppCoreBuilder::new()
    }

    pub fn id(&self) -> CoreId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn status(&self) -> CoreStatus {
        if self.is_stopped() {
            CoreStatus::Stopped
        } else if self.is_started() {
            CoreStatus::Running
        } else if self.failed.load(Ordering::Acquire) {
            CoreStatus::Failed
        } else {
            CoreStatus::Created
        }
    }

    pub fn metrics(&self) -> CoreMetrics {
        let cached = self.singletons.get().map_or(0, SingletonCache::len);
        self.metrics.snapshot(cached)
    }

    /// 工厂名称，启动后按询问顺序排列
    pub fn factory_names(&self) -> Vec<&'static str> {
        match self.pool.get() {
            Some(pool) => pool.factories().iter().map(|factory| factory.name()).collect(),
            None => self
                .pending_factories
                .lock()
                .iter()
                .map(|factory| factory.name())
                .collect(),
        }
    }

    /// 启动核心
    ///
    /// 依次创建单例缓存、启动工厂池（以及其中的全部工厂）、执行核心启动钩子，
    /// 全部成功后才标记为已启动。启动失败的核心不能再次启动。
    pub fn start(self: &Arc<Self>) -> CoreResult<()> {
        let _lifecycle = self.lifecycle.lock();

        if self.is_stopped() {
            return Err(CoreError::Stopped {
                target: self.name.clone(),
            });
        }
        if self.is_started() {
            return Err(CoreError::AlreadyStarted {
                core: self.name.clone(),
            });
        }
        if self.failed.load(Ordering::Acquire) {
            return Err(CoreError::StartAborted {
                core: self.name.clone(),
            });
        }

        info!("启动核心: {} ({})", self.name, self.id);
        self.singletons.get_or_init(SingletonCache::new);
        let pool = self
            .pool
            .get_or_init(|| FactoryPool::new(std::mem::take(&mut *self.pending_factories.lock())));

        if let Err(error) = self.start_pool(pool) {
            error!("核心启动失败: {}, 原因: {}", self.name, error);
            self.failed.store(true, Ordering::Release);
            return Err(error);
        }

        self.started.store(true, Ordering::Release);
        self.metrics.mark_started();
        info!("核心已启动: {}，共 {} 个工厂", self.name, pool.len());
        Ok(())
    }

    fn start_pool(self: &Arc<Self>, pool: &FactoryPool) -> CoreResult<()> {
        pool.start_all(self)?;
        self.hooks
            .on_start(self)
            .map_err(|source| CoreError::StartupHookFailed {
                core: self.name.clone(),
                source,
            })
    }

    /// 停止核心
    ///
    /// 先执行核心停止钩子，然后无论钩子是否失败，都会按解析的相反顺序停止缓存的单例，
    /// 再停止工厂池。所有失败在清理完成后一并返回。
    ///
    /// 标记停止之前会等待进行中的解析完成，之后的解析一律返回 `Stopped`。
    pub fn stop(&self) -> CoreResult<()> {
        let _lifecycle = self.lifecycle.lock();

        if self.is_stopped() {
            return Ok(());
        }
        if !self.is_started() {
            return Err(CoreError::NotStarted {
                target: format!("stop {}", self.name),
            });
        }

        info!("停止核心: {} ({})", self.name, self.id);
        let mut failures = Vec::new();
        if let Err(error) = self.hooks.on_stop(self) {
            error!("核心停止钩子失败: {}, 原因: {}", self.name, error);
            failures.push(ShutdownFailure::new(self.name.clone(), error));
        }

        {
            let _resolving = self.resolving.write();
            self.stopped.store(true, Ordering::Release);
        }
        failures.extend(self.release());
        self.metrics.mark_stopped();

        if failures.is_empty() {
            info!("核心已停止: {}", self.name);
            Ok(())
        } else {
            warn!("核心已停止: {}，{} 个组件停止失败", self.name, failures.len());
            Err(CoreError::ShutdownFailed { failures })
        }
    }

    fn release(&self) -> Vec<ShutdownFailure> {
        let mut failures = Vec::new();
        if let Some(cache) = self.singletons.get() {
            failures.extend(cache.stop_all());
        }
        if let Some(pool) = self.pool.get() {
            failures.extend(pool.stop_all());
        }
        failures
    }

    /// 解析单例组件
    ///
    /// 同一个接口的工厂遍历最多成功执行一次，并发调用方会等待正在进行的解析并得到同一个实例。
    /// 未解析到组件时返回 `Ok(None)`，且不会缓存这一结果。
    pub fn get<T>(self: &Arc<Self>) -> CoreResult<Option<Arc<T>>>
    where
        T: ?Sized + SingletonComponent,
    {
        self.get_with::<T, _>(|_| {})
    }

    /// 解析单例组件，首次解析成功时调用 `on_resolved`
    pub fn get_with<T, F>(self: &Arc<Self>, on_resolved: F) -> CoreResult<Option<Arc<T>>>
    where
        T: ?Sized + SingletonComponent,
        F: FnOnce(&Arc<T>),
    {
        let request = ComponentRequest::singleton::<T>();
        // 嵌套解析在同一线程上重复获取读锁
        let _resolving = self.resolving.read_recursive();
        self.ensure_running(&request)?;
        let cache = self.singletons.get().ok_or_else(|| CoreError::NotStarted {
            target: request.type_name().to_string(),
        })?;

        let cell = cache.cell(request.type_id());
        if let Some(entry) = cell.get() {
            debug!("单例缓存命中: {}", request.type_name());
            return entry.get::<T>().map(Some);
        }

        let _guard = ResolutionGuard::enter(request.interface())?;
        let result = cell.get_or_try_init(|| {
            let Some(resolved) = self.walk(&request)? else {
                return Err(Resolution::Miss);
            };
            let original = Self::into_interface::<T>(&request, resolved)?;
            on_resolved(&original);

            let filtered = self
                .hooks
                .on_get(&request, ResolvedComponent::new(Arc::clone(&original)));
            let component = self.adopt(&request, original, filtered)?;
            cache.track(&component);
            debug!("单例已缓存: {}", request.type_name());
            Ok(CachedSingleton::new(request.type_name(), component))
        });

        match result {
            Ok(entry) => entry.get::<T>().map(Some),
            Err(Resolution::Miss) => {
                debug!("未解析到单例: {}", request.type_name());
                Ok(None)
            }
            Err(Resolution::Failed(error)) => Err(error),
        }
    }

    /// 创建多实例组件，每次调用都会重新遍历工厂
    pub fn create<T>(self: &Arc<Self>) -> CoreResult<Option<Arc<T>>>
    where
        T: ?Sized + MultipleComponent,
    {
        self.create_with::<T, _>(|_| {})
    }

    pub fn create_with<T, F>(self: &Arc<Self>, on_resolved: F) -> CoreResult<Option<Arc<T>>>
    where
        T: ?Sized + MultipleComponent,
        F: FnOnce(&Arc<T>),
    {
        let request = ComponentRequest::multiple::<T>();
        let _resolving = self.resolving.read_recursive();
        self.ensure_running(&request)?;

        let Some(resolved) = self.walk(&request)? else {
            debug!("未创建组件: {}", request.type_name());
            return Ok(None);
        };
        let original = Self::into_interface::<T>(&request, resolved)?;
        on_resolved(&original);

        let filtered = self
            .hooks
            .on_create(&request, ResolvedComponent::new(Arc::clone(&original)));
        let component = self.adopt(&request, original, filtered)?;
        self.metrics.record_created();
        Ok(Some(component))
    }

    /// 附加外部构造的组件
    ///
    /// 组件必须事先通过 [`ComponentLifecycle::declare_owner`] 声明本核心为所属核心，
    /// 处于 `None` 状态的组件会被立即启动。
    pub fn attach<T>(self: &Arc<Self>, component: &T) -> CoreResult<()>
    where
        T: ?Sized + Component,
    {
        match component.owner_id() {
            Some(owner) if owner == self.id => {}
            Some(owner) => {
                return Err(CoreError::OwnershipConflict {
                    type_name: component.name().to_string(),
                    reason: format!("组件属于核心 {}", owner),
                })
            }
            None => {
                return Err(CoreError::OwnershipConflict {
                    type_name: component.name().to_string(),
                    reason: "组件未声明所属核心".to_string(),
                })
            }
        }

        if component.state() == ComponentState::None {
            component
                .start(self)
                .map_err(|source| CoreError::ComponentStartFailed {
                    type_name: component.name().to_string(),
                    source,
                })?;
        }

        debug!("组件已附加: {}", component.name());
        Ok(())
    }

    /// 与 [`AppCore::attach`] 相同，归属冲突时返回 `false`
    ///
    /// 组件启动钩子失败时组件仍然被视为已附加，错误只记录日志。
    pub fn try_attach<T>(self: &Arc<Self>, component: &T) -> bool
    where
        T: ?Sized + Component,
    {
        match self.attach(component) {
            Ok(()) => true,
            Err(CoreError::OwnershipConflict { type_name, reason }) => {
                debug!("组件无法附加: {}, 原因: {}", type_name, reason);
                false
            }
            Err(error) => {
                warn!("组件附加时启动失败: {}", error);
                true
            }
        }
    }

    fn ensure_running(&self, request: &ComponentRequest) -> CoreResult<()> {
        if self.is_stopped() {
            return Err(CoreError::Stopped {
                target: request.type_name().to_string(),
            });
        }
        if !self.is_started() {
            return Err(CoreError::NotStarted {
                target: request.type_name().to_string(),
            });
        }
        Ok(())
    }

    /// 按顺序询问工厂，返回第一个成功创建的组件
    fn walk(self: &Arc<Self>, request: &ComponentRequest) -> CoreResult<Option<ResolvedComponent>> {
        let pool = self.pool.get().ok_or_else(|| CoreError::NotStarted {
            target: request.type_name().to_string(),
        })?;
        self.metrics.record_walk();

        for factory in pool.factories() {
            if !factory.is_supported(request)? {
                continue;
            }

            debug!("询问工厂: {} -> {}", factory.name(), request);
            let Some(component) = factory.create(request)? else {
                continue;
            };

            if component.state() == ComponentState::None {
                component
                    .start(self)
                    .map_err(|source| CoreError::ComponentStartFailed {
                        type_name: request.type_name().to_string(),
                        source,
                    })?;
            }
            debug!(
                "工厂 {} 解析出组件: {} -> {}",
                factory.name(),
                request.type_name(),
                component.component_name()
            );
            return Ok(Some(component));
        }

        self.metrics.record_miss();
        Ok(None)
    }

    /// 取出请求的接口，类型不符的组件会被停止后丢弃
    fn into_interface<T>(request: &ComponentRequest, component: ResolvedComponent) -> CoreResult<Arc<T>>
    where
        T: ?Sized + Component,
    {
        component.downcast::<T>().map_err(|component| {
            if let Err(error) = component.stop() {
                warn!("丢弃的组件停止失败: {}, 原因: {}", component.component_name(), error);
            }
            CoreError::TypeMismatch {
                expected: request.type_name().to_string(),
                actual: component.interface().name().to_string(),
            }
        })
    }

    /// 接收过滤钩子返回的组件
    ///
    /// 被替换的原组件会被停止，尚未启动的替代组件由本核心启动。
    fn adopt<T>(
        self: &Arc<Self>,
        request: &ComponentRequest,
        original: Arc<T>,
        filtered: ResolvedComponent,
    ) -> CoreResult<Arc<T>>
    where
        T: ?Sized + Component,
    {
        let component = match Self::into_interface::<T>(request, filtered) {
            Ok(component) => component,
            Err(error) => {
                Self::discard(&*original);
                return Err(error);
            }
        };

        if Arc::as_ptr(&component).cast::<()>() == Arc::as_ptr(&original).cast::<()>() {
            return Ok(component);
        }

        debug!("过滤钩子替换了组件: {} -> {}", original.name(), component.name());
        Self::discard(&*original);
        if component.state() == ComponentState::None {
            component
                .start(self)
                .map_err(|source| CoreError::ComponentStartFailed {
                    type_name: request.type_name().to_string(),
                    source,
                })?;
        }
        Ok(component)
    }

    fn discard<T: ?Sized + Component>(component: &T) {
        if let Err(error) = component.stop() {
            warn!("丢弃的组件停止失败: {}, 原因: {}", component.name(), error);
        }
    }
}

impl Drop for AppCore {
    fn drop(&mut self) {
        if self.is_stopped() {
            return;
        }

        if self.is_started() {
            if let Err(error) = self.stop() {
                warn!("核心释放时停止失败: {}, 原因: {}", self.name, error);
            }
        } else if self.failed.load(Ordering::Acquire) {
            // 启动失败前已经启动的工厂
            for failure in self.release() {
                warn!("核心释放时停止失败: {}", failure);
            }
        }
    }
}

impl fmt::Debug for AppCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCore")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status())
            .field("factories", &self.factory_names())
            .finish()
    }
}
