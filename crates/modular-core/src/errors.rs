//! 运行时错误类型定义

use std::fmt;
use thiserror::Error;

/// 组件钩子返回的错误类型
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// 组件钩子结果
pub type HookResult = Result<(), HookError>;

/// 组件生命周期转换错误
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("组件{phase}钩子执行失败: {component}, 原因: {source}")]
    HookFailed {
        component: String,
        phase: LifecyclePhase,
        #[source]
        source: HookError,
    },

    #[error("组件已停止，无法再次启动: {component}")]
    AlreadyStopped { component: String },

    #[error("组件所属核心不匹配: {component} (声明 {declared}, 实际 {actual})")]
    OwnerMismatch {
        component: String,
        declared: String,
        actual: String,
    },
}

/// 生命周期钩子所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Start,
    Stop,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "启动"),
            Self::Stop => write!(f, "停止"),
        }
    }
}

/// 类型发现配置错误
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("无效的模块忽略规则: {pattern}, 原因: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// 关闭过程中单个组件的失败记录
#[derive(Debug)]
pub struct ShutdownFailure {
    pub component: String,
    pub error: HookError,
}

impl ShutdownFailure {
    pub fn new(component: impl Into<String>, error: impl Into<HookError>) -> Self {
        Self {
            component: component.into(),
            error: error.into(),
        }
    }
}

impl fmt::Display for ShutdownFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.component, self.error)
    }
}

fn join_failures(failures: &[ShutdownFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// 运行时核心错误
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("核心尚未启动: {target}")]
    NotStarted { target: String },

    #[error("核心已停止: {target}")]
    Stopped { target: String },

    #[error("核心已经启动: {core}")]
    AlreadyStarted { core: String },

    #[error("核心此前启动失败，无法再次启动: {core}")]
    StartAborted { core: String },

    #[error("无效的组件请求: {type_name}, 原因: {reason}")]
    InvalidRequest { type_name: String, reason: String },

    #[error("组件归属冲突: {type_name}, 原因: {reason}")]
    OwnershipConflict { type_name: String, reason: String },

    #[error("工厂启动失败: {factory}, 原因: {source}")]
    FactoryStartFailed {
        factory: String,
        #[source]
        source: LifecycleError,
    },

    #[error("核心启动钩子失败: {core}, 原因: {source}")]
    StartupHookFailed {
        core: String,
        #[source]
        source: HookError,
    },

    #[error("组件启动失败: {type_name}, 原因: {source}")]
    ComponentStartFailed {
        type_name: String,
        #[source]
        source: LifecycleError,
    },

    #[error("工厂创建组件失败: {factory} -> {type_name}, 原因: {source}")]
    FactoryFailed {
        factory: String,
        type_name: String,
        #[source]
        source: HookError,
    },

    #[error("组件类型不匹配: 期望 {expected}, 实际 {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("检测到循环解析: {chain}")]
    CircularResolution { chain: String },

    #[error("核心关闭时出现 {} 个错误: {}", .failures.len(), join_failures(.failures))]
    ShutdownFailed { failures: Vec<ShutdownFailure> },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

impl CoreError {
    /// 是否为调用方使用错误（不应重试）
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::NotStarted { .. }
                | Self::Stopped { .. }
                | Self::AlreadyStarted { .. }
                | Self::StartAborted { .. }
                | Self::InvalidRequest { .. }
        )
    }
}

/// 生命周期操作结果
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// 核心操作结果
pub type CoreResult<T> = Result<T, CoreError>;
