//! 组合层错误

use modular_core::{CoreError, DiscoveryError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("配置加载失败: {source}")]
    Config {
        #[from]
        source: config::ConfigError,
    },

    #[error("日志初始化失败: {message}")]
    Logging { message: String },

    #[error("组件发现配置无效: {source}")]
    Discovery {
        #[from]
        source: DiscoveryError,
    },

    #[error("运行时核心错误: {source}")]
    Core {
        #[from]
        source: CoreError,
    },

    #[error("未知的立即启动组件: {name}")]
    UnknownImmediateComponent { name: String },

    #[error("立即启动组件未能解析: {name}")]
    ImmediateComponentMissing { name: String },
}

pub type CompositionResult<T> = Result<T, CompositionError>;
