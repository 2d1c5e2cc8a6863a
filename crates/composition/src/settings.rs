//! 运行时配置
//!
//! 配置来自可选的配置文件（TOML / JSON / YAML，按扩展名识别）和环境变量。
//! 环境变量使用 `APPCORE` 前缀，层级之间用 `__` 分隔，例如
//! `APPCORE__LOGGING__LEVEL=debug`、`APPCORE__STARTUP__IMMEDIATE=Clock,Cache`。

use crate::errors::CompositionResult;
use crate::logging::LoggingConfig;
use modular_core::DiscoveryOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "APPCORE";

/// 环境变量层级分隔符
pub const ENV_SEPARATOR: &str = "__";

/// 运行时配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// 核心名称
    pub name: String,
    pub logging: LoggingConfig,
    pub discovery: DiscoverySettings,
    pub startup: StartupManifest,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: "app-core".to_string(),
            logging: LoggingConfig::default(),
            discovery: DiscoverySettings::default(),
            startup: StartupManifest::default(),
        }
    }
}

impl RuntimeConfig {
    /// 只从环境变量加载
    pub fn load() -> CompositionResult<Self> {
        Self::build(None, None)
    }

    /// 从配置文件加载，环境变量覆盖文件中的值
    pub fn from_file<P: AsRef<Path>>(path: P) -> CompositionResult<Self> {
        Self::build(Some(path.as_ref()), None)
    }

    /// 使用给定的环境变量表代替进程环境
    pub fn from_sources(
        path: Option<&Path>,
        environment: HashMap<String, String>,
    ) -> CompositionResult<Self> {
        Self::build(path, Some(environment))
    }

    fn build(path: Option<&Path>, environment: Option<HashMap<String, String>>) -> CompositionResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!("加载配置文件: {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("startup.immediate")
                    .with_list_parse_key("discovery.ignored_modules")
                    .source(environment),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        debug!("运行时配置: {:?}", config);
        Ok(config)
    }
}

/// 组件发现配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// 是否安装默认组件工厂
    pub enabled: bool,
    /// 被忽略模块的 glob 规则
    pub ignored_modules: Vec<String>,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ignored_modules: Vec::new(),
        }
    }
}

impl DiscoverySettings {
    pub fn options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            ignored_modules: self.ignored_modules.clone(),
        }
    }
}

/// 启动清单
///
/// 列出核心启动后需要立即解析的单例接口名称。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupManifest {
    pub immediate: Vec<String>,
}

impl StartupManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_immediate(mut self, name: impl Into<String>) -> Self {
        self.immediate.push(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.immediate.is_empty()
    }
}
