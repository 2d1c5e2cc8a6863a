//! 核心标识、状态与运行指标

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// 核心实例标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoreId(Uuid);

impl CoreId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 核心运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreStatus {
    /// 已创建，尚未启动
    Created,
    /// 启动失败，不能再次启动
    Failed,
    /// 运行中
    Running,
    /// 已停止
    Stopped,
}

impl fmt::Display for CoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Failed => write!(f, "Failed"),
            Self::Running => write!(f, "Running"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// 核心运行指标快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreMetrics {
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    /// 已缓存的单例数量
    pub cached_singletons: usize,
    /// 已执行的工厂遍历次数
    pub factory_walks: u64,
    /// 未解析到组件的遍历次数
    pub resolution_misses: u64,
    /// 通过 `create` 创建的实例数量
    pub created_components: u64,
}

#[derive(Debug, Default)]
pub(crate) struct MetricsRecorder {
    started_at: Mutex<Option<DateTime<Utc>>>,
    stopped_at: Mutex<Option<DateTime<Utc>>>,
    walks: AtomicU64,
    misses: AtomicU64,
    created: AtomicU64,
}

impl MetricsRecorder {
    pub(crate) fn mark_started(&self) {
        *self.started_at.lock() = Some(Utc::now());
    }

    pub(crate) fn mark_stopped(&self) {
        *self.stopped_at.lock() = Some(Utc::now());
    }

    pub(crate) fn record_walk(&self) {
        self.walks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, cached_singletons: usize) -> CoreMetrics {
        CoreMetrics {
            started_at: *self.started_at.lock(),
            stopped_at: *self.stopped_at.lock(),
            cached_singletons,
            factory_walks: self.walks.load(Ordering::Relaxed),
            resolution_misses: self.misses.load(Ordering::Relaxed),
            created_components: self.created.load(Ordering::Relaxed),
        }
    }
}
