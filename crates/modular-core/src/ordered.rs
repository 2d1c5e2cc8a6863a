//! 有序容器
//!
//! 注册阶段收集元素，第一次物化时按排序键稳定排序，之后只读。

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::fmt;
use tracing::warn;

/// 提供排序键的元素
pub trait Ordered {
    fn order_key(&self) -> u32;
}

/// 只物化一次的有序列表
pub struct OrderedList<T> {
    pending: Mutex<Vec<T>>,
    items: OnceCell<Vec<T>>,
}

impl<T: Ordered> OrderedList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            pending: Mutex::new(items),
            items: OnceCell::new(),
        }
    }

    /// 在物化前追加元素，物化之后返回 `false`
    pub fn push(&self, item: T) -> bool {
        if self.items.get().is_some() {
            warn!("有序列表已经物化，忽略新元素");
            return false;
        }
        self.pending.lock().push(item);
        true
    }

    pub fn is_materialized(&self) -> bool {
        self.items.get().is_some()
    }

    /// 物化列表
    ///
    /// 排序键相同的元素保持注册顺序。`on_materialized` 只在第一次物化时调用，
    /// 之后的调用直接返回已有的列表。
    pub fn materialize<E, F>(&self, on_materialized: F) -> Result<&[T], E>
    where
        F: FnOnce(&[T]) -> Result<(), E>,
    {
        let mut first = false;
        let items = self.items.get_or_init(|| {
            first = true;
            let mut items = std::mem::take(&mut *self.pending.lock());
            items.sort_by_key(|item| item.order_key());
            items
        });

        if first {
            on_materialized(items)?;
        }
        Ok(items)
    }

    /// 已物化的元素，尚未物化时为空
    pub fn items(&self) -> &[T] {
        self.items.get().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        match self.items.get() {
            Some(items) => items.len(),
            None => self.pending.lock().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Ordered> Default for OrderedList<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> fmt::Debug for OrderedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedList")
            .field("materialized", &self.items.get().is_some())
            .finish()
    }
}
