//! 单例缓存

use crate::component::Component;
use crate::errors::{CoreError, CoreResult, ShutdownFailure};
use crate::resolved::ShutdownHandle;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::sync::Arc;
use tracing::warn;

/// 缓存中的单例，内部是 `Arc<T>`
pub(crate) struct CachedSingleton {
    interface: &'static str,
    instance: Box<dyn Any + Send + Sync>,
}

impl CachedSingleton {
    pub(crate) fn new<T: ?Sized + Component>(interface: &'static str, instance: Arc<T>) -> Self {
        Self {
            interface,
            instance: Box::new(instance),
        }
    }

    pub(crate) fn get<T: ?Sized + Component>(&self) -> CoreResult<Arc<T>> {
        self.instance
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| CoreError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                actual: self.interface.to_string(),
            })
    }
}

pub(crate) struct SingletonCache {
    entries: DashMap<TypeId, Arc<OnceCell<CachedSingleton>>>,
    shutdown_order: Mutex<Vec<ShutdownHandle>>,
}

impl SingletonCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::new(),
            shutdown_order: Mutex::new(Vec::new()),
        }
    }

    /// 获取接口对应的缓存单元
    ///
    /// 返回克隆的 `Arc`，初始化期间不持有分片锁。
    pub(crate) fn cell(&self, interface: TypeId) -> Arc<OnceCell<CachedSingleton>> {
        Arc::clone(self.entries.entry(interface).or_default().value())
    }

    /// 记录单例，停止时按相反顺序停止
    pub(crate) fn track<T: ?Sized + Component>(&self, instance: &Arc<T>) {
        self.shutdown_order.lock().push(ShutdownHandle::new(instance));
    }

    pub(crate) fn len(&self) -> usize {
        self.shutdown_order.lock().len()
    }

    /// 按解析的相反顺序停止所有单例并清空缓存
    pub(crate) fn stop_all(&self) -> Vec<ShutdownFailure> {
        let handles = std::mem::take(&mut *self.shutdown_order.lock());
        let mut failures = Vec::new();

        for handle in handles.iter().rev() {
            if let Err(error) = handle.stop() {
                warn!("单例停止失败: {}, 原因: {}", handle.name(), error);
                failures.push(ShutdownFailure::new(handle.name(), error));
            }
        }

        self.entries.clear();
        failures
    }
}
