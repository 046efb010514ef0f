//! 类型描述符：Rust 没有运行时反射，这里用显式的类型描述表代替。
//!
//! 每个参与映射的类型实现 [`Reflect`]，给出自己的 [`Type`]（种类、名称、元素类型、
//! struct 字段表）以及取值/编码逻辑。业务 struct 通过 [`sql_struct!`](crate::sql_struct)
//! 一次性声明字段表，之后由 [`Mapper`](crate::mapper::Mapper) 展开成字段树并缓存。

use crate::value::SqlValue;
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};

#[doc(hidden)]
pub use serde_json::{Map as JsonMap, Value as JsonValue};

/// 类型种类（对齐 Go `reflect.Kind` 中本库关心的子集）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    String,
    Struct,
    Slice,
    Array,
    Map,
    /// 可空包装（`Option<T>`）。
    Ptr,
    /// 动态值（如 `serde_json::Value`）。
    Interface,
}

impl Kind {
    /// 该种类的值本身是否可以为 NULL。
    pub fn is_nullable(self) -> bool {
        matches!(self, Self::Ptr | Self::Slice | Self::Map | Self::Interface)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Self::Int | Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            Self::Uint | Self::Uint8 | Self::Uint16 | Self::Uint32 | Self::Uint64
        )
    }
}

/// 延迟取得 struct 字段表的函数；延迟求值使自引用类型（`Option<Box<Self>>`）的描述有限。
pub type FieldsFn = fn() -> Vec<FieldDesc>;

/// 一个类型的描述。
#[derive(Clone)]
pub struct Type {
    kind: Kind,
    name: &'static str,
    id: Option<TypeId>,
    elem: Option<Box<Type>>,
    key: Option<Box<Type>>,
    len: usize,
    fields: Option<FieldsFn>,
}

impl std::fmt::Debug for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Type")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("elem", &self.elem)
            .field("key", &self.key)
            .field("len", &self.len)
            .field("has_fields", &self.fields.is_some())
            .finish()
    }
}

impl Type {
    fn base(kind: Kind, name: &'static str) -> Self {
        Self {
            kind,
            name,
            id: None,
            elem: None,
            key: None,
            len: 0,
            fields: None,
        }
    }

    /// 内置标量类型。
    pub fn scalar<T: 'static>(kind: Kind) -> Self {
        let mut t = Self::base(kind, std::any::type_name::<T>());
        t.id = Some(TypeId::of::<T>());
        t
    }

    /// 具名的叶子类型：不会被展开，schema 按名称识别（如 `spatial.Point`）。
    pub fn opaque(name: &'static str, kind: Kind) -> Self {
        Self::base(kind, name)
    }

    /// 可展开的 struct 类型。
    pub fn structure<T: 'static>(fields: FieldsFn) -> Self {
        let mut t = Self::base(Kind::Struct, std::any::type_name::<T>());
        t.id = Some(TypeId::of::<T>());
        t.fields = Some(fields);
        t
    }

    pub fn ptr(elem: Type) -> Self {
        let mut t = Self::base(Kind::Ptr, "");
        t.elem = Some(Box::new(elem));
        t
    }

    pub fn slice(elem: Type) -> Self {
        let mut t = Self::base(Kind::Slice, "");
        t.elem = Some(Box::new(elem));
        t
    }

    pub fn array(elem: Type, len: usize) -> Self {
        let mut t = Self::base(Kind::Array, "");
        t.elem = Some(Box::new(elem));
        t.len = len;
        t
    }

    pub fn map(key: Type, value: Type) -> Self {
        let mut t = Self::base(Kind::Map, "");
        t.key = Some(Box::new(key));
        t.elem = Some(Box::new(value));
        t
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> Option<TypeId> {
        self.id
    }

    pub fn elem(&self) -> Option<&Type> {
        self.elem.as_deref()
    }

    pub fn key(&self) -> Option<&Type> {
        self.key.as_deref()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 剥掉所有 `Ptr` 层，得到实际的元素类型。
    pub fn deref(&self) -> &Type {
        let mut t = self;
        while t.kind == Kind::Ptr {
            match t.elem.as_deref() {
                Some(e) => t = e,
                None => break,
            }
        }
        t
    }

    /// 可展开的 struct（带字段表）。
    pub fn is_struct(&self) -> bool {
        self.kind == Kind::Struct && self.fields.is_some()
    }

    /// struct 字段表；非 struct 返回 None。
    pub fn fields(&self) -> Option<Vec<FieldDesc>> {
        self.fields.map(|f| f())
    }

    /// 两个描述是否指向同一个 Rust 类型。
    pub fn same_as(&self, other: &Type) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// struct 中一个声明字段的描述。
#[derive(Debug, Clone)]
pub struct FieldDesc {
    /// Rust 字段名。
    pub name: &'static str,
    /// 原始映射 tag：`name,key,key=value`。
    pub tag: &'static str,
    pub ty: Type,
    /// 匿名嵌入（字段会被提升到外层命名空间）。
    pub embedded: bool,
    /// 非导出字段（未嵌入时会被跳过）。
    pub exported: bool,
}

/// 可被映射器识别、并能编码为 SQL 参数的类型。
pub trait Reflect: 'static {
    fn reflect_type() -> Type
    where
        Self: Sized;

    /// 编码为驱动参数。
    fn encode(&self) -> SqlValue;

    /// 编码为 JSON（用于 struct/slice/map 这类 JSON 列）。
    fn to_json(&self) -> JsonValue;

    /// 按遍历下标取值；空下标表示自身。
    fn value_at(&self, index: &[usize]) -> Option<SqlValue> {
        if index.is_empty() {
            Some(self.encode())
        } else {
            None
        }
    }
}

/// 宏内部用：借助字段访问闭包推导字段类型，避免在宏里手写类型。
#[doc(hidden)]
pub fn field_type<S, F, A>(_accessor: A) -> Type
where
    F: Reflect,
    A: for<'a> Fn(&'a S) -> &'a F,
{
    F::reflect_type()
}

/// 宏内部用：把一个字段写进 struct 的 JSON 对象。
///
/// 嵌入字段（且无显式名称）展开到外层，但不覆盖外层已有的同名键。
#[doc(hidden)]
pub fn json_field(
    obj: &mut JsonMap<String, JsonValue>,
    rust_name: &'static str,
    tag: &'static str,
    embedded: bool,
    exported: bool,
    value: JsonValue,
) {
    if !exported && !embedded {
        return;
    }
    let name = tag.split(',').next().unwrap_or("").trim();
    if name == "-" {
        return;
    }
    if embedded && name.is_empty() {
        if let JsonValue::Object(inner) = value {
            for (k, v) in inner {
                obj.entry(k).or_insert(v);
            }
            return;
        }
    }
    let key = if name.is_empty() { rust_name } else { name };
    obj.insert(key.to_string(), value);
}

macro_rules! reflect_signed {
    ($($t:ty => $kind:ident),+ $(,)?) => {
        $(impl Reflect for $t {
            fn reflect_type() -> Type {
                Type::scalar::<$t>(Kind::$kind)
            }

            fn encode(&self) -> SqlValue {
                SqlValue::I64(*self as i64)
            }

            fn to_json(&self) -> JsonValue {
                JsonValue::from(*self as i64)
            }
        })+
    };
}

macro_rules! reflect_unsigned {
    ($($t:ty => $kind:ident),+ $(,)?) => {
        $(impl Reflect for $t {
            fn reflect_type() -> Type {
                Type::scalar::<$t>(Kind::$kind)
            }

            fn encode(&self) -> SqlValue {
                SqlValue::U64(*self as u64)
            }

            fn to_json(&self) -> JsonValue {
                JsonValue::from(*self as u64)
            }
        })+
    };
}

reflect_signed!(i8 => Int8, i16 => Int16, i32 => Int32, i64 => Int64, isize => Int);
reflect_unsigned!(u8 => Uint8, u16 => Uint16, u32 => Uint32, u64 => Uint64, usize => Uint);

impl Reflect for bool {
    fn reflect_type() -> Type {
        Type::scalar::<bool>(Kind::Bool)
    }

    fn encode(&self) -> SqlValue {
        SqlValue::Bool(*self)
    }

    fn to_json(&self) -> JsonValue {
        JsonValue::Bool(*self)
    }
}

impl Reflect for f32 {
    fn reflect_type() -> Type {
        Type::scalar::<f32>(Kind::Float32)
    }

    fn encode(&self) -> SqlValue {
        SqlValue::F64(*self as f64)
    }

    fn to_json(&self) -> JsonValue {
        JsonValue::from(*self as f64)
    }
}

impl Reflect for f64 {
    fn reflect_type() -> Type {
        Type::scalar::<f64>(Kind::Float64)
    }

    fn encode(&self) -> SqlValue {
        SqlValue::F64(*self)
    }

    fn to_json(&self) -> JsonValue {
        JsonValue::from(*self)
    }
}

impl Reflect for String {
    fn reflect_type() -> Type {
        Type::scalar::<String>(Kind::String)
    }

    fn encode(&self) -> SqlValue {
        SqlValue::from(self.clone())
    }

    fn to_json(&self) -> JsonValue {
        JsonValue::String(self.clone())
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn reflect_type() -> Type {
        Type::ptr(T::reflect_type())
    }

    fn encode(&self) -> SqlValue {
        match self {
            Some(v) => v.encode(),
            None => SqlValue::Null,
        }
    }

    fn to_json(&self) -> JsonValue {
        match self {
            Some(v) => v.to_json(),
            None => JsonValue::Null,
        }
    }

    fn value_at(&self, index: &[usize]) -> Option<SqlValue> {
        match self {
            Some(v) => v.value_at(index),
            None => Some(SqlValue::Null),
        }
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn reflect_type() -> Type {
        T::reflect_type()
    }

    fn encode(&self) -> SqlValue {
        (**self).encode()
    }

    fn to_json(&self) -> JsonValue {
        (**self).to_json()
    }

    fn value_at(&self, index: &[usize]) -> Option<SqlValue> {
        (**self).value_at(index)
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn reflect_type() -> Type {
        Type::slice(T::reflect_type())
    }

    fn encode(&self) -> SqlValue {
        if T::reflect_type().kind() == Kind::Uint8 {
            let bytes = self
                .iter()
                .filter_map(|v| match v.encode() {
                    SqlValue::U64(b) => u8::try_from(b).ok(),
                    _ => None,
                })
                .collect::<Vec<u8>>();
            return SqlValue::Bytes(bytes);
        }
        SqlValue::Json(self.to_json())
    }

    fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.iter().map(Reflect::to_json).collect())
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn reflect_type() -> Type {
        Type::array(T::reflect_type(), N)
    }

    fn encode(&self) -> SqlValue {
        SqlValue::Json(self.to_json())
    }

    fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.iter().map(Reflect::to_json).collect())
    }
}

impl<V: Reflect> Reflect for HashMap<String, V> {
    fn reflect_type() -> Type {
        Type::map(String::reflect_type(), V::reflect_type())
    }

    fn encode(&self) -> SqlValue {
        SqlValue::Json(self.to_json())
    }

    fn to_json(&self) -> JsonValue {
        // 排序后输出，保证编码结果稳定
        let sorted: BTreeMap<&String, &V> = self.iter().collect();
        JsonValue::Object(
            sorted
                .into_iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl<V: Reflect> Reflect for BTreeMap<String, V> {
    fn reflect_type() -> Type {
        Type::map(String::reflect_type(), V::reflect_type())
    }

    fn encode(&self) -> SqlValue {
        SqlValue::Json(self.to_json())
    }

    fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
    }
}

impl Reflect for JsonValue {
    fn reflect_type() -> Type {
        Type::opaque(JSON_TYPE_NAME, Kind::Interface)
    }

    fn encode(&self) -> SqlValue {
        SqlValue::Json(self.clone())
    }

    fn to_json(&self) -> JsonValue {
        self.clone()
    }
}

pub const JSON_TYPE_NAME: &str = "serde_json::Value";
pub const DATETIME_TYPE_NAME: &str = "time::OffsetDateTime";
pub const PRIMITIVE_DATETIME_TYPE_NAME: &str = "time::PrimitiveDateTime";
pub const DATE_TYPE_NAME: &str = "time::Date";

impl Reflect for time::OffsetDateTime {
    fn reflect_type() -> Type {
        Type::opaque(DATETIME_TYPE_NAME, Kind::Struct)
    }

    fn encode(&self) -> SqlValue {
        SqlValue::DateTime(*self)
    }

    fn to_json(&self) -> JsonValue {
        self.format(&time::format_description::well_known::Rfc3339)
            .map(JsonValue::String)
            .unwrap_or(JsonValue::Null)
    }
}

impl Reflect for time::PrimitiveDateTime {
    fn reflect_type() -> Type {
        Type::opaque(PRIMITIVE_DATETIME_TYPE_NAME, Kind::Struct)
    }

    fn encode(&self) -> SqlValue {
        SqlValue::DateTime(self.assume_utc())
    }

    fn to_json(&self) -> JsonValue {
        self.assume_utc().to_json()
    }
}

impl Reflect for time::Date {
    fn reflect_type() -> Type {
        Type::opaque(DATE_TYPE_NAME, Kind::Struct)
    }

    fn encode(&self) -> SqlValue {
        SqlValue::Date(*self)
    }

    fn to_json(&self) -> JsonValue {
        JsonValue::String(self.to_string())
    }
}

/// 为业务 struct 声明字段表并实现 [`Reflect`]。
///
/// 用法示例：
///
/// ```ignore
/// #[derive(Default)]
/// struct Model { id: i64, created_at: time::OffsetDateTime }
///
/// #[derive(Default)]
/// struct User { model: Model, name: String, secret: String }
///
/// halo_sqlike::sql_struct! {
///   impl Model {
///     id:         { tag: "id,auto_increment,primary_key" },
///     created_at: { tag: "" },
///   }
/// }
///
/// halo_sqlike::sql_struct! {
///   impl User {
///     model:  { tag: "", embedded: true },
///     name:   { tag: "name,size=60" },
///     secret: { tag: "", exported: false },
///   }
/// }
/// ```
#[macro_export]
macro_rules! sql_struct {
    (
        impl $ty:ty {
            $(
                $field:ident : { tag: $tag:literal $(, embedded: $emb:literal)? $(, exported: $exp:literal)? $(,)? }
            ),* $(,)?
        }
    ) => {
        impl $crate::reflect::Reflect for $ty {
            fn reflect_type() -> $crate::reflect::Type {
                fn fields() -> Vec<$crate::reflect::FieldDesc> {
                    vec![
                        $(
                            $crate::reflect::FieldDesc {
                                name: stringify!($field),
                                tag: $tag,
                                ty: $crate::reflect::field_type(|v: &$ty| &v.$field),
                                embedded: $crate::__sql_struct_flag!(false $(, $emb)?),
                                exported: $crate::__sql_struct_flag!(true $(, $exp)?),
                            }
                        ),*
                    ]
                }
                $crate::reflect::Type::structure::<$ty>(fields)
            }

            fn encode(&self) -> $crate::value::SqlValue {
                $crate::value::SqlValue::Json($crate::reflect::Reflect::to_json(self))
            }

            fn to_json(&self) -> $crate::reflect::JsonValue {
                let mut obj = $crate::reflect::JsonMap::new();
                $(
                    $crate::reflect::json_field(
                        &mut obj,
                        stringify!($field),
                        $tag,
                        $crate::__sql_struct_flag!(false $(, $emb)?),
                        $crate::__sql_struct_flag!(true $(, $exp)?),
                        $crate::reflect::Reflect::to_json(&self.$field),
                    );
                )*
                $crate::reflect::JsonValue::Object(obj)
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn value_at(&self, index: &[usize]) -> Option<$crate::value::SqlValue> {
                let Some((&first, rest)) = index.split_first() else {
                    return Some($crate::reflect::Reflect::encode(self));
                };
                let mut i = 0_usize;
                $(
                    if first == i {
                        return $crate::reflect::Reflect::value_at(&self.$field, rest);
                    }
                    i += 1;
                )*
                None
            }
        }
    };
}

/// 宏内部 helper：支持可选的布尔参数。
#[doc(hidden)]
#[macro_export]
macro_rules! __sql_struct_flag {
    ($default:literal) => {
        $default
    };
    ($default:literal, $custom:literal) => {
        $custom
    };
}
