//! Schema builder：把映射后的字段转换为列定义。
//!
//! 字段先按类型名（时间、空间类型等具名叶子类型）查找类别，找不到再按 [`Kind`] 归类；
//! 每个类别对应一个由方言注册的列构造函数。

use crate::mapper::StructField;
use crate::reflect::{Kind, Type};
use std::collections::HashMap;

pub const SPATIAL_POINT: &str = "spatial.Point";
pub const SPATIAL_LINE_STRING: &str = "spatial.LineString";
pub const SPATIAL_POLYGON: &str = "spatial.Polygon";
pub const SPATIAL_MULTI_POINT: &str = "spatial.MultiPoint";
pub const SPATIAL_MULTI_LINE_STRING: &str = "spatial.MultiLineString";
pub const SPATIAL_MULTI_POLYGON: &str = "spatial.MultiPolygon";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("schema field {field}: unsupported type {type_name}")]
    UnsupportedType { field: String, type_name: String },
    #[error("schema field {field}: invalid {tag} tag value {value:?}")]
    InvalidTag {
        field: String,
        tag: &'static str,
        value: String,
    },
}

/// 字段的语义类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    Bool,
    Int,
    Uint,
    Float,
    DateTime,
    Date,
    Bytes,
    Json,
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

/// 列定义。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// 基础类型名，如 `VARCHAR`。
    pub data_type: String,
    /// 完整类型，如 `VARCHAR(191)`、`INT UNSIGNED`。
    pub sql_type: String,
    pub size: usize,
    pub nullable: bool,
    /// None 表示不输出 DEFAULT。
    pub default_value: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub extra: String,
}

/// 表级默认配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaConfig {
    pub charset: String,
    pub collation: String,
    /// 没有 `size` tag 时 VARCHAR 的长度。
    pub string_size: usize,
    /// 没有 `size` tag 时 DATETIME 的小数秒精度。
    pub time_precision: usize,
    pub engine: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            charset: "utf8mb4".to_string(),
            collation: "utf8mb4_unicode_ci".to_string(),
            string_size: 191,
            time_precision: 6,
            engine: "INNODB".to_string(),
        }
    }
}

/// 列构造函数。
pub type ColumnFn = fn(&SchemaConfig, &StructField) -> Result<Column, SchemaError>;

/// 类别注册表。
#[derive(Clone)]
pub struct Builder {
    config: SchemaConfig,
    names: HashMap<&'static str, DataType>,
    columns: HashMap<DataType, ColumnFn>,
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("config", &self.config)
            .field("names", &self.names)
            .field("columns", &self.columns.len())
            .finish()
    }
}

impl Builder {
    pub fn new(config: SchemaConfig) -> Self {
        Self {
            config,
            names: HashMap::new(),
            columns: HashMap::new(),
        }
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// 按类型名指定类别（优先于按 Kind 归类）。
    pub fn set_type_name(&mut self, name: &'static str, dt: DataType) -> &mut Self {
        self.names.insert(name, dt);
        self
    }

    pub fn set_column(&mut self, dt: DataType, f: ColumnFn) -> &mut Self {
        self.columns.insert(dt, f);
        self
    }

    /// 解析类型的类别。
    pub fn lookup(&self, ty: &Type) -> Option<DataType> {
        let t = ty.deref();
        if let Some(dt) = self.names.get(t.name()) {
            return Some(*dt);
        }
        let dt = match t.kind() {
            Kind::String => DataType::String,
            Kind::Bool => DataType::Bool,
            Kind::Int | Kind::Int8 | Kind::Int16 | Kind::Int32 | Kind::Int64 => DataType::Int,
            Kind::Uint | Kind::Uint8 | Kind::Uint16 | Kind::Uint32 | Kind::Uint64 => {
                DataType::Uint
            }
            Kind::Float32 | Kind::Float64 => DataType::Float,
            Kind::Slice if t.elem().map(Type::kind) == Some(Kind::Uint8) => DataType::Bytes,
            Kind::Slice | Kind::Array | Kind::Map | Kind::Struct | Kind::Interface => {
                DataType::Json
            }
            Kind::Ptr => return None,
        };
        Some(dt)
    }

    /// 字段的列定义。
    pub fn get_column(&self, sf: &StructField) -> Result<Column, SchemaError> {
        let unsupported = || SchemaError::UnsupportedType {
            field: sf.path().to_string(),
            type_name: format!("{:?} {}", sf.ty().deref().kind(), sf.ty().deref().name()),
        };
        let dt = self.lookup(sf.ty()).ok_or_else(unsupported)?;
        let f = self.columns.get(&dt).ok_or_else(unsupported)?;
        f(&self.config, sf)
    }
}
