//! halo-sqlike：面向 MySQL 的链式查询构建与结构体映射库。
//!
//! - [`expr`] / [`primitive`]：与方言无关的表达式 IR；
//! - [`actions`]：find / update / delete / insert 的链式累加器；
//! - [`mysql`]：按节点种类分发的 MySQL 语句编译器；
//! - [`mapper`] / [`reflect`]：struct 字段树展开与缓存；
//! - [`schema`] / [`mysql_schema`] / [`indexes`]：列定义与 DDL 生成。

pub mod actions;
#[cfg(test)]
mod actions_tests;
pub mod builder;
pub mod create_table;
pub mod dialect;
pub mod expr;
pub mod field_mapper;
pub mod indexes;
pub mod macros;
#[cfg(test)]
mod macros_tests;
pub mod mapper;
#[cfg(test)]
mod mapper_tests;
pub mod modifiers;
pub mod mysql;
pub mod mysql_schema;
#[cfg(test)]
mod mysql_tests;
pub mod primitive;
pub mod reflect;
pub mod schema;
mod string_builder;
pub mod value;
pub mod valuer;

pub use crate::actions::{
    DeleteActions, DeleteOneActions, FindActions, FindOneActions, InsertActions, Join, JoinKind,
    PaginateActions, UpdateActions, UpdateOneActions, delete, delete_one, find, find_one, insert,
    paginate, update, update_one,
};
pub use crate::builder::{BuildError, Statement, StatementBuilder};
pub use crate::create_table::CreateTableBuilder;
pub use crate::dialect::Dialect;
pub use crate::expr::*;
pub use crate::field_mapper::{
    FieldMapperFunc, identity_mapper, kebab_case_mapper, prefix_mapper, snake_case_mapper,
    suffix_mapper, upper_case_mapper,
};
pub use crate::indexes::{Direction, Index, IndexColumn, IndexKind, asc_column, desc_column};
pub use crate::mapper::{Mapper, Struct, StructField, Tag};
pub use crate::modifiers::Arg;
pub use crate::mysql::{Compile, MySqlBuilder};
pub use crate::mysql_schema::MySqlSchema;
pub use crate::primitive::{Expr, ExprKind, IntoColumn, IntoCondition, IntoValue, IntoValues};
pub use crate::reflect::{FieldDesc, Kind, Reflect, Type};
pub use crate::schema::{Column, SchemaConfig, SchemaError};
pub use crate::value::{SqlValue, ValueKind};
pub use crate::valuer::{SqlValuer, ValuerError};
