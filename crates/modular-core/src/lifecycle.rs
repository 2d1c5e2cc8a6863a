//! 组件生命周期状态机
//!
//! 状态只会向前推进：`None → Started → Stopped`。

use crate::app::{AppCore, CoreId};
use crate::errors::{HookResult, LifecycleError, LifecyclePhase, LifecycleResult};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// 组件生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComponentState {
    /// 尚未启动
    #[default]
    None,
    /// 已启动
    Started,
    /// 已停止（终态）
    Stopped,
}

impl ComponentState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Started,
            2 => Self::Stopped,
            _ => Self::None,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Started => 1,
            Self::Stopped => 2,
        }
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Started => write!(f, "Started"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

#[derive(Clone)]
struct OwnerRef {
    id: CoreId,
    core: Weak<AppCore>,
}

/// 组件生命周期簿记
///
/// 每个组件内嵌一个 `ComponentBase`，由它保存状态和所属核心。
/// 状态转换通过互斥锁串行化，状态读取是无锁的。
pub struct ComponentBase {
    state: AtomicU8,
    transition: Mutex<()>,
    owner: OnceCell<OwnerRef>,
}

impl ComponentBase {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ComponentState::None.as_u8()),
            transition: Mutex::new(()),
            owner: OnceCell::new(),
        }
    }

    pub fn state(&self) -> ComponentState {
        ComponentState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// 所属核心标识
    pub fn owner_id(&self) -> Option<CoreId> {
        self.owner.get().map(|owner| owner.id)
    }

    /// 所属核心，核心已释放时返回 `None`
    pub fn core(&self) -> Option<Arc<AppCore>> {
        self.owner.get().and_then(|owner| owner.core.upgrade())
    }

    /// 在启动前声明所属核心
    ///
    /// 所属核心只能设置一次，重复声明同一个核心是允许的。
    pub fn declare_owner(&self, component: &str, core: &Arc<AppCore>) -> LifecycleResult<()> {
        let owner = self.owner.get_or_init(|| OwnerRef {
            id: core.id(),
            core: Arc::downgrade(core),
        });

        if owner.id == core.id() {
            Ok(())
        } else {
            Err(LifecycleError::OwnerMismatch {
                component: component.to_string(),
                declared: owner.id.to_string(),
                actual: core.id().to_string(),
            })
        }
    }

    /// 执行启动转换
    ///
    /// 只有 `None` 状态会执行钩子；钩子失败时状态仍然推进到 `Started`。
    pub(crate) fn start_with<F>(&self, component: &str, core: &Arc<AppCore>, hook: F) -> LifecycleResult<()>
    where
        F: FnOnce() -> HookResult,
    {
        let _transition = self.transition.lock();

        match self.state() {
            ComponentState::Started => return Ok(()),
            ComponentState::Stopped => {
                return Err(LifecycleError::AlreadyStopped {
                    component: component.to_string(),
                })
            }
            ComponentState::None => {}
        }

        self.declare_owner(component, core)?;

        debug!("启动组件: {}", component);
        let advance = AdvanceOnDrop {
            state: &self.state,
            to: ComponentState::Started,
        };
        let result = hook();
        drop(advance);

        result.map_err(|source| LifecycleError::HookFailed {
            component: component.to_string(),
            phase: LifecyclePhase::Start,
            source,
        })
    }

    /// 执行停止转换
    ///
    /// 只有 `Started` 状态会执行钩子；钩子失败时状态仍然推进到 `Stopped`。
    pub(crate) fn stop_with<F>(&self, component: &str, hook: F) -> LifecycleResult<()>
    where
        F: FnOnce() -> HookResult,
    {
        let _transition = self.transition.lock();

        match self.state() {
            ComponentState::Started => {}
            ComponentState::None => {
                debug!("组件尚未启动，忽略停止请求: {}", component);
                return Ok(());
            }
            ComponentState::Stopped => return Ok(()),
        }

        debug!("停止组件: {}", component);
        let advance = AdvanceOnDrop {
            state: &self.state,
            to: ComponentState::Stopped,
        };
        let result = hook();
        drop(advance);

        result.map_err(|source| LifecycleError::HookFailed {
            component: component.to_string(),
            phase: LifecyclePhase::Stop,
            source,
        })
    }
}

impl Default for ComponentBase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ComponentBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentBase")
            .field("state", &self.state())
            .field("owner", &self.owner_id())
            .finish()
    }
}

/// 钩子返回或发生 panic 时都推进状态
struct AdvanceOnDrop<'a> {
    state: &'a AtomicU8,
    to: ComponentState,
}

impl Drop for AdvanceOnDrop<'_> {
    fn drop(&mut self) {
        self.state.store(self.to.as_u8(), Ordering::Release);
    }
}
