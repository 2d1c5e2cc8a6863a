//! # 运行时组合层
//!
//! 把运行时核心与配置、日志组合在一起：
//!
//! - **运行时配置**: 通过 `config` crate 从配置文件和环境变量加载
//! - **日志初始化**: 基于 `tracing-subscriber`，支持文本和 JSON 格式
//! - **启动清单**: 核心启动后立即解析的单例组件
//! - **运行时启动器**: 组装、启动和关闭核心
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use modular_composition::{RuntimeBootstrapper, RuntimeConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = RuntimeBootstrapper::new(RuntimeConfig::load()?)
//!         .with_logging(true)
//!         .bootstrap()?;
//!
//!     println!("核心状态: {}", runtime.core().status());
//!
//!     runtime.shutdown()?;
//!     Ok(())
//! }
//! ```

pub mod bootstrapper;
pub mod errors;
pub mod logging;
pub mod settings;

pub use bootstrapper::{Runtime, RuntimeBootstrapper};
pub use errors::{CompositionError, CompositionResult};
pub use logging::{initialize_logging, LoggingConfig};
pub use settings::{DiscoverySettings, RuntimeConfig, StartupManifest, ENV_PREFIX, ENV_SEPARATOR};
