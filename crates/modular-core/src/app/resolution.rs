//! 每线程的解析栈，用于发现循环解析

use crate::errors::{CoreError, CoreResult};
use crate::metadata::TypeInfo;
use std::cell::RefCell;

thread_local! {
    static RESOLVING: RefCell<Vec<TypeInfo>> = RefCell::new(Vec::new());
}

/// 解析期间保持的守卫，离开作用域时出栈
pub(crate) struct ResolutionGuard {
    _private: (),
}

impl ResolutionGuard {
    pub(crate) fn enter(interface: &TypeInfo) -> CoreResult<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|entry| entry.id() == interface.id()) {
                let chain = stack
                    .iter()
                    .chain(std::iter::once(interface))
                    .map(TypeInfo::short_name)
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(CoreError::CircularResolution { chain });
            }
            stack.push(*interface);
            Ok(Self { _private: () })
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
