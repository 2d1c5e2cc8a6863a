//! 核心扩展点

use super::AppCore;
use crate::errors::HookResult;
use crate::metadata::ComponentRequest;
use crate::resolved::ResolvedComponent;
use std::sync::Arc;

/// 核心钩子
///
/// `on_get` / `on_create` 接收解析出的组件并返回最终交给调用方的组件，
/// 可以用来包装或替换实例。替换后的组件必须仍然实现请求的接口。
pub trait CoreHooks: Send + Sync + 'static {
    /// 工厂池启动之后、核心标记为已启动之前执行
    fn on_start(&self, _core: &Arc<AppCore>) -> HookResult {
        Ok(())
    }

    /// 停止缓存单例和工厂池之前执行
    fn on_stop(&self, _core: &AppCore) -> HookResult {
        Ok(())
    }

    /// 单例在写入缓存之前经过的过滤器
    fn on_get(&self, _request: &ComponentRequest, component: ResolvedComponent) -> ResolvedComponent {
        component
    }

    /// 多实例组件返回给调用方之前经过的过滤器
    fn on_create(&self, _request: &ComponentRequest, component: ResolvedComponent) -> ResolvedComponent {
        component
    }
}

/// 不做任何处理的默认钩子
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl CoreHooks for NoopHooks {}
