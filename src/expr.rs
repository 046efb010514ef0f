//! 表达式构造函数。
//!
//! 左操作数一律经过 [`IntoColumn`]：字符串成为列引用，已有的表达式原样传递；
//! 右操作数经过 [`IntoValue`]：普通值成为绑定参数。

use crate::actions::FindActions;
use crate::primitive::{
    Aggregate, AggregateBy, As, C, CastAs, Column, DataType, Exists, Expr, Func, Group,
    IntoColumn, IntoCondition, IntoValue, IntoValues, JsonFunc, KV, L, Lock, LockMode, Math,
    MathMode, Nil, Operator, Order, R, Raw, Sort, Values,
};

fn clause(field: impl IntoColumn, operator: Operator, value: Expr) -> Expr {
    Expr::Clause(C {
        field: Box::new(field.into_column()),
        operator,
        value: Box::new(value),
    })
}

/// 列引用。
pub fn column(name: impl Into<String>) -> Expr {
    Expr::Column(Column {
        table: String::new(),
        name: name.into(),
    })
}

/// 带表名（或表别名）的列引用。
pub fn table_column(table: impl Into<String>, name: impl Into<String>) -> Expr {
    Expr::Column(Column {
        table: table.into(),
        name: name.into(),
    })
}

pub fn equal(field: impl IntoColumn, value: impl IntoValue) -> Expr {
    clause(field, Operator::Equal, value.into_value())
}

pub fn not_equal(field: impl IntoColumn, value: impl IntoValue) -> Expr {
    clause(field, Operator::NotEqual, value.into_value())
}

pub fn greater_than(field: impl IntoColumn, value: impl IntoValue) -> Expr {
    clause(field, Operator::GreaterThan, value.into_value())
}

pub fn greater_or_equal(field: impl IntoColumn, value: impl IntoValue) -> Expr {
    clause(field, Operator::GreaterOrEqual, value.into_value())
}

pub fn lower_than(field: impl IntoColumn, value: impl IntoValue) -> Expr {
    clause(field, Operator::LowerThan, value.into_value())
}

pub fn lower_or_equal(field: impl IntoColumn, value: impl IntoValue) -> Expr {
    clause(field, Operator::LowerOrEqual, value.into_value())
}

fn range(from: impl IntoValue, to: impl IntoValue) -> Expr {
    Expr::Range(R {
        from: Box::new(from.into_value()),
        to: Box::new(to.into_value()),
    })
}

/// `field BETWEEN from AND to`。
pub fn between(field: impl IntoColumn, from: impl IntoValue, to: impl IntoValue) -> Expr {
    clause(field, Operator::Between, range(from, to))
}

pub fn not_between(field: impl IntoColumn, from: impl IntoValue, to: impl IntoValue) -> Expr {
    clause(field, Operator::NotBetween, range(from, to))
}

/// `field IN (...)`；空集合渲染为 `IN ()`。
pub fn in_(field: impl IntoColumn, values: impl IntoValues) -> Expr {
    clause(field, Operator::In, values.into_values())
}

pub fn not_in(field: impl IntoColumn, values: impl IntoValues) -> Expr {
    clause(field, Operator::NotIn, values.into_values())
}

/// `value MEMBER OF(field)`，`field` 是一个 JSON 数组列。
pub fn member_of(field: impl IntoColumn, value: impl IntoValue) -> Expr {
    clause(field, Operator::MemberOf, value.into_value())
}

pub fn like(field: impl IntoColumn, value: impl IntoValue) -> Expr {
    Expr::Like(L {
        field: Box::new(field.into_column()),
        is_not: false,
        value: Box::new(value.into_value()),
    })
}

pub fn not_like(field: impl IntoColumn, value: impl IntoValue) -> Expr {
    Expr::Like(L {
        field: Box::new(field.into_column()),
        is_not: true,
        value: Box::new(value.into_value()),
    })
}

pub fn is_null(field: impl IntoColumn) -> Expr {
    Expr::Nil(Nil {
        field: Box::new(field.into_column()),
        is_not: false,
    })
}

pub fn is_not_null(field: impl IntoColumn) -> Expr {
    Expr::Nil(Nil {
        field: Box::new(field.into_column()),
        is_not: true,
    })
}

fn join_conditions<I>(conds: I, op: &str) -> Expr
where
    I: IntoIterator,
    I::Item: IntoCondition,
{
    let mut items: Vec<Expr> = conds
        .into_iter()
        .filter_map(IntoCondition::into_condition)
        .collect();
    match items.len() {
        0 => Expr::Group(Group::default()),
        1 => items.swap_remove(0),
        n => {
            let mut values = Vec::with_capacity(n * 2 + 1);
            values.push(raw("("));
            for (i, item) in items.into_iter().enumerate() {
                if i > 0 {
                    values.push(raw(op));
                }
                values.push(item);
            }
            values.push(raw(")"));
            Expr::Group(Group { values })
        }
    }
}

/// 用 AND 连接条件；`None` 与零值条件被过滤。
///
/// 过滤后没有条件时返回空 Group，只剩一个时原样返回，否则返回 `(a AND b ...)`。
pub fn and<I>(conds: I) -> Expr
where
    I: IntoIterator,
    I::Item: IntoCondition,
{
    join_conditions(conds, " AND ")
}

/// 用 OR 连接条件，规则同 [`and`]。
pub fn or<I>(conds: I) -> Expr
where
    I: IntoIterator,
    I::Item: IntoCondition,
{
    join_conditions(conds, " OR ")
}

/// 原样输出的 SQL 片段。
pub fn raw(value: impl Into<String>) -> Expr {
    Expr::Raw(Raw {
        value: value.into(),
    })
}

pub fn asc(field: impl IntoColumn) -> Expr {
    Expr::Sort(Sort {
        field: Box::new(field.into_column()),
        order: Order::Ascending,
    })
}

pub fn desc(field: impl IntoColumn) -> Expr {
    Expr::Sort(Sort {
        field: Box::new(field.into_column()),
        order: Order::Descending,
    })
}

/// 按给定值的顺序排序：`FIELD(field,?,?,...)`。
pub fn field<I>(field: impl IntoColumn, values: I) -> Expr
where
    I: IntoIterator,
    I::Item: IntoValue,
{
    let mut args = vec![field.into_column()];
    args.extend(values.into_iter().map(IntoValue::into_value));
    Expr::Func(Func {
        name: "FIELD".to_string(),
        args,
    })
}

/// UPDATE SET 赋值 `field = value`。
pub fn column_value(field: impl IntoColumn, value: impl IntoValue) -> Expr {
    Expr::KV(KV {
        field: Box::new(field.into_column()),
        value: Box::new(value.into_value()),
    })
}

pub fn increment(field: impl IntoColumn, value: impl IntoValue) -> Expr {
    Expr::Math(Math {
        field: Box::new(field.into_column()),
        mode: MathMode::Add,
        value: Box::new(value.into_value()),
    })
}

pub fn decrement(field: impl IntoColumn, value: impl IntoValue) -> Expr {
    Expr::Math(Math {
        field: Box::new(field.into_column()),
        mode: MathMode::Subtract,
        value: Box::new(value.into_value()),
    })
}

fn aggregate(field: impl IntoColumn, by: AggregateBy) -> Expr {
    Expr::Aggregate(Aggregate {
        field: Box::new(field.into_column()),
        by,
    })
}

/// `COUNT(field)`；`count("*")` 渲染为 `COUNT(*)`。
pub fn count(field: impl IntoColumn) -> Expr {
    aggregate(field, AggregateBy::Count)
}

pub fn count_distinct(field: impl IntoColumn) -> Expr {
    aggregate(field, AggregateBy::CountDistinct)
}

pub fn sum(field: impl IntoColumn) -> Expr {
    aggregate(field, AggregateBy::Sum)
}

pub fn avg(field: impl IntoColumn) -> Expr {
    aggregate(field, AggregateBy::Average)
}

pub fn max(field: impl IntoColumn) -> Expr {
    aggregate(field, AggregateBy::Max)
}

pub fn min(field: impl IntoColumn) -> Expr {
    aggregate(field, AggregateBy::Min)
}

pub fn as_(field: impl IntoColumn, alias: impl Into<String>) -> Expr {
    Expr::As(As {
        field: Box::new(field.into_column()),
        alias: alias.into(),
    })
}

pub fn cast_as(value: impl IntoValue, data_type: DataType) -> Expr {
    Expr::CastAs(CastAs {
        value: Box::new(value.into_value()),
        data_type,
    })
}

/// 任意函数调用；参数按值位置处理（需要列时用 [`column`]）。
pub fn func<I>(name: impl Into<String>, args: I) -> Expr
where
    I: IntoIterator,
    I::Item: IntoValue,
{
    Expr::Func(Func {
        name: name.into(),
        args: args.into_iter().map(IntoValue::into_value).collect(),
    })
}

fn json_func(name: &'static str, args: Vec<Expr>) -> Expr {
    Expr::JsonFunc(JsonFunc { name, args })
}

/// `JSON_EXTRACT(doc, path, ...)`。
pub fn json_extract<I>(doc: impl IntoColumn, paths: I) -> Expr
where
    I: IntoIterator,
    I::Item: IntoValue,
{
    let mut args = vec![doc.into_column()];
    args.extend(paths.into_iter().map(IntoValue::into_value));
    json_func("JSON_EXTRACT", args)
}

/// `JSON_CONTAINS(target, candidate[, path])`。
pub fn json_contains(
    target: impl IntoColumn,
    candidate: impl IntoValue,
    path: Option<&str>,
) -> Expr {
    let mut args = vec![target.into_column(), candidate.into_value()];
    if let Some(p) = path {
        args.push(p.to_string().into_value());
    }
    json_func("JSON_CONTAINS", args)
}

pub fn json_quote(value: impl IntoValue) -> Expr {
    json_func("JSON_QUOTE", vec![value.into_value()])
}

pub fn json_unquote(value: impl IntoColumn) -> Expr {
    json_func("JSON_UNQUOTE", vec![value.into_column()])
}

/// `JSON_SET(doc, path, value, ...)`。
pub fn json_set<I, P, V>(doc: impl IntoColumn, pairs: I) -> Expr
where
    I: IntoIterator<Item = (P, V)>,
    P: IntoValue,
    V: IntoValue,
{
    let mut args = vec![doc.into_column()];
    for (p, v) in pairs {
        args.push(p.into_value());
        args.push(v.into_value());
    }
    json_func("JSON_SET", args)
}

pub fn exists(query: FindActions) -> Expr {
    Expr::Exists(Exists {
        is_not: false,
        query: Box::new(query),
    })
}

pub fn not_exists(query: FindActions) -> Expr {
    Expr::Exists(Exists {
        is_not: true,
        query: Box::new(query),
    })
}

/// 值列表 `(?,?,...)`。
pub fn values<I>(values: I) -> Expr
where
    I: IntoIterator,
    I::Item: IntoValue,
{
    Expr::Values(Values {
        values: values.into_iter().map(IntoValue::into_value).collect(),
    })
}

/// 列元组 ``(`a`,`b`)``，用于行构造比较；列不能为空。
pub fn pair<I>(columns: I) -> Expr
where
    I: IntoIterator,
    I::Item: IntoColumn,
{
    let values: Vec<Expr> = columns.into_iter().map(IntoColumn::into_column).collect();
    assert!(!values.is_empty(), "pair: at least one column is required");
    Expr::Values(Values { values })
}

pub fn for_update() -> Lock {
    Lock {
        mode: LockMode::ForUpdate,
        option: None,
    }
}

pub fn for_share() -> Lock {
    Lock {
        mode: LockMode::ForShare,
        option: None,
    }
}

pub fn lock_in_share_mode() -> Lock {
    Lock {
        mode: LockMode::LockInShareMode,
        option: None,
    }
}
