//! 类型发现
//!
//! 默认工厂通过 [`TypeDiscovery`] 查找能够提供某个接口、并且可以无参构造的具体类型。
//! 内置实现 [`TypeCatalog`] 由应用显式登记候选类型。

use crate::component::Component;
use crate::errors::DiscoveryError;
use crate::metadata::{module_path_of, TypeInfo};
use crate::resolved::ResolvedComponent;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// 始终被忽略的系统模块
const SYSTEM_MODULES: &[&str] = &["std", "core", "alloc"];

/// 类型发现接口
pub trait TypeDiscovery: Send + Sync {
    /// 已知的全部候选类型
    fn candidates(&self) -> Vec<Arc<CandidateType>>;

    /// 模块是否被排除在发现范围之外
    fn is_ignored(&self, module_path: &str) -> bool;

    /// 枚举未被忽略的候选类型
    fn enumerate(&self) -> Vec<Arc<CandidateType>> {
        self.candidates()
            .into_iter()
            .filter(|candidate| !self.is_ignored(candidate.module_path()))
            .collect()
    }
}

/// 类型发现选项
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryOptions {
    /// 被忽略模块的 glob 规则，例如 `app::legacy::*`
    pub ignored_modules: Vec<String>,
}

impl DiscoveryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore_module(mut self, pattern: impl Into<String>) -> Self {
        self.ignored_modules.push(pattern.into());
        self
    }
}

/// 候选类型对某个接口的实现方式
#[derive(Clone)]
pub struct InterfaceBinding {
    interface: TypeInfo,
    concrete: TypeInfo,
    construct: Arc<dyn Fn() -> ResolvedComponent + Send + Sync>,
}

impl InterfaceBinding {
    pub fn interface(&self) -> &TypeInfo {
        &self.interface
    }

    pub fn concrete(&self) -> &TypeInfo {
        &self.concrete
    }

    /// 无参构造一个新实例
    pub fn construct(&self) -> ResolvedComponent {
        (self.construct)()
    }
}

impl fmt::Debug for InterfaceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceBinding")
            .field("interface", &self.interface.name())
            .field("concrete", &self.concrete.name())
            .finish()
    }
}

/// 候选类型
#[derive(Debug, Clone)]
pub struct CandidateType {
    type_info: TypeInfo,
    module_path: String,
    bindings: Vec<InterfaceBinding>,
}

impl CandidateType {
    /// 开始描述具体类型 `C`
    pub fn of<C: Component + Default>() -> CandidateBuilder<C> {
        let type_info = TypeInfo::of::<C>();
        CandidateBuilder {
            candidate: CandidateType {
                type_info,
                module_path: module_path_of(type_info.name()).to_string(),
                bindings: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    pub fn bindings(&self) -> &[InterfaceBinding] {
        &self.bindings
    }

    /// 提供接口 `interface` 的绑定
    pub fn binding_for(&self, interface: TypeId) -> Option<&InterfaceBinding> {
        self.bindings
            .iter()
            .find(|binding| binding.interface.id() == interface)
    }
}

/// 候选类型构建器
pub struct CandidateBuilder<C> {
    candidate: CandidateType,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Component + Default> CandidateBuilder<C> {
    /// 声明 `C` 提供接口 `I`
    ///
    /// `upcast` 通常写作 `|component| component as Arc<dyn I>`。
    pub fn provides<I: ?Sized + Component>(mut self, upcast: fn(Arc<C>) -> Arc<I>) -> Self {
        self.candidate.bindings.push(InterfaceBinding {
            interface: TypeInfo::of::<I>(),
            concrete: self.candidate.type_info,
            construct: Arc::new(move || ResolvedComponent::new::<I>(upcast(Arc::new(C::default())))),
        });
        self
    }

    /// 覆盖从类型名推导出的模块路径
    pub fn in_module(mut self, module_path: impl Into<String>) -> Self {
        self.candidate.module_path = module_path.into();
        self
    }

    pub fn build(self) -> CandidateType {
        self.candidate
    }
}

impl<C: Component + Default> From<CandidateBuilder<C>> for CandidateType {
    fn from(builder: CandidateBuilder<C>) -> Self {
        builder.build()
    }
}

/// 由应用显式登记的类型目录
pub struct TypeCatalog {
    candidates: RwLock<Vec<Arc<CandidateType>>>,
    ignored: Vec<glob::Pattern>,
    options: DiscoveryOptions,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self {
            candidates: RwLock::new(Vec::new()),
            ignored: Vec::new(),
            options: DiscoveryOptions::default(),
        }
    }

    /// 使用忽略规则创建类型目录
    pub fn with_options(options: DiscoveryOptions) -> Result<Self, DiscoveryError> {
        let ignored = options
            .ignored_modules
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|source| DiscoveryError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            candidates: RwLock::new(Vec::new()),
            ignored,
            options,
        })
    }

    /// 登记候选类型，登记顺序决定同一接口的匹配优先级
    pub fn register(&self, candidate: impl Into<CandidateType>) {
        let candidate = candidate.into();
        debug!(
            "登记候选类型: {} ({} 个接口)",
            candidate.type_info().name(),
            candidate.bindings().len()
        );
        self.candidates.write().push(Arc::new(candidate));
    }

    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.candidates.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeDiscovery for TypeCatalog {
    fn candidates(&self) -> Vec<Arc<CandidateType>> {
        self.candidates.read().clone()
    }

    fn is_ignored(&self, module_path: &str) -> bool {
        let system = SYSTEM_MODULES.iter().any(|system| {
            module_path == *system
                || module_path
                    .strip_prefix(system)
                    .is_some_and(|rest| rest.starts_with("::"))
        });
        system || self.ignored.iter().any(|pattern| pattern.matches(module_path))
    }
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeCatalog")
            .field("candidates", &self.len())
            .field("options", &self.options)
            .finish()
    }
}
