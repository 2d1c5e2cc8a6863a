//! 组件类型元数据与解析请求

use crate::component::{Component, MultipleComponent, SingletonComponent};
use crate::errors::{CoreError, CoreResult};
use std::any::{type_name, TypeId};
use std::fmt;

/// 类型信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    /// 获取类型 `T` 的类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 完整类型名称，例如 `dyn app::services::Clock`
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 去掉 `dyn ` 前缀和模块路径后的类型名称
    pub fn short_name(&self) -> &'static str {
        let name = strip_dyn(self.name);
        let path = name.split('<').next().unwrap_or(name);
        let start = path.rfind("::").map_or(0, |index| index + 2);
        &name[start..]
    }

    /// 类型所在的模块路径
    pub fn module_path(&self) -> &'static str {
        module_path_of(self.name)
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn strip_dyn(name: &'static str) -> &'static str {
    name.strip_prefix("dyn ").unwrap_or(name)
}

/// 从完整类型名称中截取模块路径
pub(crate) fn module_path_of(name: &'static str) -> &'static str {
    let name = strip_dyn(name);
    let path = name.split('<').next().unwrap_or(name);
    path.rfind("::").map_or("", |index| &name[..index])
}

/// 请求的组件基数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// 通过 `AppCore::get` 解析，结果被缓存
    Singleton,
    /// 通过 `AppCore::create` 解析，每次都是新实例
    Multiple,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton => write!(f, "singleton"),
            Self::Multiple => write!(f, "multiple"),
        }
    }
}

/// 一次组件解析请求
///
/// 工厂接口需要保持对象安全，因此泛型参数 `T` 在这里被擦除为
/// [`TypeInfo`]，工厂通过 [`ComponentRequest::is`] 判断请求的接口。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentRequest {
    interface: TypeInfo,
    cardinality: Cardinality,
    trait_object: bool,
}

impl ComponentRequest {
    /// 单例组件请求
    pub fn singleton<T: ?Sized + SingletonComponent>() -> Self {
        Self::new::<T>(Cardinality::Singleton)
    }

    /// 多实例组件请求
    pub fn multiple<T: ?Sized + MultipleComponent>() -> Self {
        Self::new::<T>(Cardinality::Multiple)
    }

    pub fn new<T: ?Sized + Component>(cardinality: Cardinality) -> Self {
        Self {
            interface: TypeInfo::of::<T>(),
            cardinality,
            // trait object 引用是胖指针
            trait_object: std::mem::size_of::<&T>() > std::mem::size_of::<&()>(),
        }
    }

    pub fn interface(&self) -> &TypeInfo {
        &self.interface
    }

    pub fn type_id(&self) -> TypeId {
        self.interface.id()
    }

    pub fn type_name(&self) -> &'static str {
        self.interface.name()
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// 请求的接口是否为 `T`
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.interface.is::<T>()
    }

    /// 校验请求：必须是接口类型，且不能是根标记接口
    pub fn validate(&self) -> CoreResult<()> {
        if !self.trait_object {
            return Err(CoreError::InvalidRequest {
                type_name: self.type_name().to_string(),
                reason: "请求的类型必须是组件接口 (dyn Trait)".to_string(),
            });
        }

        let root_markers = [
            TypeId::of::<dyn Component>(),
            TypeId::of::<dyn SingletonComponent>(),
            TypeId::of::<dyn MultipleComponent>(),
        ];
        if root_markers.contains(&self.type_id()) {
            return Err(CoreError::InvalidRequest {
                type_name: self.type_name().to_string(),
                reason: "不能直接请求根组件接口".to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for ComponentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.interface, self.cardinality)
    }
}
