//! SqlValuer：在编译阶段才计算出实际参数值的扩展点。
//!
//! 编译器遇到 `Arg::Valuer` 时调用 `value()`，得到的 `SqlValue` 再走一次编码器注册表；
//! 返回的错误会原样包进 `BuildError::Valuer`。

use crate::value::SqlValue;

/// Valuer 错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("sql valuer error: {0}")]
pub struct ValuerError(pub String);

/// 可在编译阶段动态计算实际值的 trait。
pub trait SqlValuer: dyn_clone::DynClone + std::fmt::Debug {
    fn value(&self) -> Result<SqlValue, ValuerError>;
}

dyn_clone::clone_trait_object!(SqlValuer);
