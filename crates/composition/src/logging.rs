//! 日志配置与初始化

use crate::errors::{CompositionError, CompositionResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别或过滤指令，例如 `info`、`modular_core=debug`
    pub level: String,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 解析过滤指令，`RUST_LOG` 优先
    pub fn env_filter(&self) -> CompositionResult<EnvFilter> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .map_err(|e| CompositionError::Logging {
                message: format!("无效的日志级别 {}: {}", self.level, e),
            })
    }
}

/// 安装全局日志订阅者
///
/// 进程内已经存在全局订阅者时沿用现有订阅者，只有过滤指令无效才返回错误。
pub fn initialize_logging(config: &LoggingConfig) -> CompositionResult<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter()?)
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_file(config.show_file)
        .with_line_number(config.show_line_number);

    let installed = if config.json_format {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    match installed {
        Ok(()) => info!("日志系统初始化完成"),
        Err(e) => debug!("全局日志订阅者已存在，沿用现有订阅者: {}", e),
    }
    Ok(())
}
