//! 组件抽象
//!
//! 组件接口是以 [`Component`] 为父 trait 的 trait object，例如 `dyn Clock`。

use crate::app::{AppCore, CoreId};
use crate::errors::{HookResult, LifecycleResult};
use crate::lifecycle::{ComponentBase, ComponentState};
use std::sync::Arc;

/// 带生命周期的组件
pub trait Component: Send + Sync + 'static {
    /// 内嵌的生命周期簿记
    fn base(&self) -> &ComponentBase;

    /// 组件名称，用于日志和错误信息
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// 启动钩子，只会执行一次
    fn on_start(&self, _core: &Arc<AppCore>) -> HookResult {
        Ok(())
    }

    /// 停止钩子，只会执行一次
    fn on_stop(&self) -> HookResult {
        Ok(())
    }
}

/// 单例组件，通过 `AppCore::get` 解析
pub trait SingletonComponent: Component {}

/// 多实例组件，通过 `AppCore::create` 解析
pub trait MultipleComponent: Component {}

/// 组件生命周期操作
///
/// 为所有组件自动实现，组件只需要覆盖 `on_start` / `on_stop` 钩子。
pub trait ComponentLifecycle {
    /// 使用所属核心启动组件
    fn start(&self, core: &Arc<AppCore>) -> LifecycleResult<()>;

    /// 停止组件
    fn stop(&self) -> LifecycleResult<()>;

    fn state(&self) -> ComponentState;

    /// 所属核心
    fn core(&self) -> Option<Arc<AppCore>>;

    fn owner_id(&self) -> Option<CoreId>;

    /// 在附加到核心之前声明所属核心
    fn declare_owner(&self, core: &Arc<AppCore>) -> LifecycleResult<()>;
}

impl<T: ?Sized + Component> ComponentLifecycle for T {
    fn start(&self, core: &Arc<AppCore>) -> LifecycleResult<()> {
        self.base()
            .start_with(self.name(), core, || self.on_start(core))
    }

    fn stop(&self) -> LifecycleResult<()> {
        self.base().stop_with(self.name(), || self.on_stop())
    }

    fn state(&self) -> ComponentState {
        self.base().state()
    }

    fn core(&self) -> Option<Arc<AppCore>> {
        self.base().core()
    }

    fn owner_id(&self) -> Option<CoreId> {
        self.base().owner_id()
    }

    fn declare_owner(&self, core: &Arc<AppCore>) -> LifecycleResult<()> {
        self.base().declare_owner(self.name(), core)
    }
}
