//! # Modular Core
//!
//! 模块化组件运行时：通过一组有序的组件工厂解析、创建、缓存和停止组件，
//! 运行时本身不需要知道任何具体的组件类型。
//!
//! ## 核心概念
//!
//! - [`Component`] - 带有 `None → Started → Stopped` 生命周期的组件
//! - [`ComponentFactory`] - 按 `order` 排序、能够创建其他组件的单例组件
//! - [`DefaultComponentFactory`] - 基于 [`TypeCatalog`] 的兜底工厂
//! - [`AppCore`] - 运行时核心，提供 `get` / `create` / `attach`
//!
//! ## 基本使用
//!
//! ```rust
//! use modular_core::{
//!     AppCore, ClosureFactory, Component, ComponentBase, SingletonComponent,
//! };
//! use std::sync::Arc;
//!
//! pub trait Clock: SingletonComponent {
//!     fn now(&self) -> u64;
//! }
//!
//! #[derive(Default)]
//! struct FixedClock {
//!     base: ComponentBase,
//! }
//!
//! impl Component for FixedClock {
//!     fn base(&self) -> &ComponentBase {
//!         &self.base
//!     }
//! }
//!
//! impl SingletonComponent for FixedClock {}
//!
//! impl Clock for FixedClock {
//!     fn now(&self) -> u64 {
//!         42
//!     }
//! }
//!
//! let core = AppCore::builder()
//!     .with_factory(
//!         ClosureFactory::new("clocks")
//!             .provide::<dyn Clock, _>(|| Some(Arc::new(FixedClock::default()) as Arc<dyn Clock>)),
//!     )
//!     .build();
//!
//! core.start().unwrap();
//! let clock = core.get::<dyn Clock>().unwrap().unwrap();
//! assert_eq!(clock.now(), 42);
//! core.stop().unwrap();
//! ```

pub mod app;
pub mod component;
pub mod default_factory;
pub mod discovery;
pub mod errors;
pub mod factory;
pub mod lifecycle;
pub mod metadata;
pub mod ordered;
mod pool;
pub mod resolved;

pub use app::*;
pub use component::*;
pub use default_factory::*;
pub use discovery::*;
pub use errors::*;
pub use factory::*;
pub use lifecycle::*;
pub use metadata::*;
pub use ordered::*;
pub use resolved::*;
