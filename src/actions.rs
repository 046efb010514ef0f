//! Actions：语句的链式累加器，只保存 IR，不生成 SQL。
//!
//! 每个方法修改自身并返回 `&mut Self`；`*OneActions` 是去掉了 `limit`/`offset` 的窄视图，
//! 编译时固定 `LIMIT 1`。

use crate::expr::{and, asc, equal, greater_than, lower_than, or};
use crate::mapper::Struct;
use crate::primitive::{
    Expr, IntoColumn, IntoCondition, IntoValue, Lock, Order, Sort,
};
use crate::reflect::Reflect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub alias: String,
    /// 零值表示没有 ON 子句。
    pub on: Expr,
}

fn into_sort(e: Expr) -> Expr {
    match e {
        Expr::Sort(_) | Expr::Func(_) | Expr::Raw(_) => e,
        other => asc(other),
    }
}

/// SELECT 语句的累加器。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindActions {
    pub database: String,
    pub table: String,
    pub distinct: bool,
    pub projections: Vec<Expr>,
    pub joins: Vec<Join>,
    pub conditions: Expr,
    pub group_bys: Vec<Expr>,
    pub having: Expr,
    pub sorts: Vec<Expr>,
    pub skip: u64,
    pub count: u64,
    pub lock: Option<Lock>,
}

pub fn find() -> FindActions {
    FindActions::default()
}

impl FindActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = table.into();
        self
    }

    pub fn database(&mut self, database: impl Into<String>) -> &mut Self {
        self.database = database.into();
        self
    }

    /// 投影列；不调用时输出 `*`。
    pub fn select(&mut self, fields: impl IntoIterator<Item = impl IntoColumn>) -> &mut Self {
        self.projections = fields.into_iter().map(IntoColumn::into_column).collect();
        self
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.distinct = true;
        self
    }

    pub fn join(
        &mut self,
        kind: JoinKind,
        table: impl Into<String>,
        alias: impl Into<String>,
        on: impl IntoIterator<Item = impl IntoCondition>,
    ) -> &mut Self {
        self.joins.push(Join {
            kind,
            table: table.into(),
            alias: alias.into(),
            on: and(on),
        });
        self
    }

    pub fn inner_join(
        &mut self,
        table: impl Into<String>,
        on: impl IntoIterator<Item = impl IntoCondition>,
    ) -> &mut Self {
        self.join(JoinKind::Inner, table, "", on)
    }

    pub fn left_join(
        &mut self,
        table: impl Into<String>,
        on: impl IntoIterator<Item = impl IntoCondition>,
    ) -> &mut Self {
        self.join(JoinKind::Left, table, "", on)
    }

    pub fn right_join(
        &mut self,
        table: impl Into<String>,
        on: impl IntoIterator<Item = impl IntoCondition>,
    ) -> &mut Self {
        self.join(JoinKind::Right, table, "", on)
    }

    pub fn cross_join(&mut self, table: impl Into<String>) -> &mut Self {
        self.join(JoinKind::Cross, table, "", Vec::<Expr>::new())
    }

    /// 设置 WHERE 条件（按 AND 连接，替换已有条件）。
    pub fn where_(&mut self, conds: impl IntoIterator<Item = impl IntoCondition>) -> &mut Self {
        self.conditions = and(conds);
        self
    }

    pub fn group_by(&mut self, fields: impl IntoIterator<Item = impl IntoColumn>) -> &mut Self {
        self.group_bys = fields.into_iter().map(IntoColumn::into_column).collect();
        self
    }

    pub fn having(&mut self, conds: impl IntoIterator<Item = impl IntoCondition>) -> &mut Self {
        self.having = and(conds);
        self
    }

    /// 排序项：列名默认升序，`asc`/`desc`/`field` 构造的表达式原样使用。
    pub fn order_by(&mut self, sorts: impl IntoIterator<Item = impl IntoColumn>) -> &mut Self {
        self.sorts = sorts
            .into_iter()
            .map(|s| into_sort(s.into_column()))
            .collect();
        self
    }

    /// 0 表示不限制。
    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.count = n;
        self
    }

    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.skip = n;
        self
    }

    pub fn lock(&mut self, lock: Lock) -> &mut Self {
        self.lock = Some(lock);
        self
    }
}

/// 窄视图的转发方法。
macro_rules! forward_actions {
    ($( $(#[$meta:meta])* $name:ident($($arg:ident : $ty:ty),*); )*) => {
        $(
            $(#[$meta])*
            pub fn $name(&mut self, $($arg: $ty),*) -> &mut Self {
                self.inner.$name($($arg),*);
                self
            }
        )*
    };
}

/// 只取一条记录的 SELECT，编译时固定 `LIMIT 1`。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneActions {
    inner: FindActions,
}

pub fn find_one() -> FindOneActions {
    FindOneActions::default()
}

impl FindOneActions {
    forward_actions! {
        from(table: impl Into<String>);
        database(database: impl Into<String>);
        select(fields: impl IntoIterator<Item = impl IntoColumn>);
        distinct();
        inner_join(table: impl Into<String>, on: impl IntoIterator<Item = impl IntoCondition>);
        left_join(table: impl Into<String>, on: impl IntoIterator<Item = impl IntoCondition>);
        where_(conds: impl IntoIterator<Item = impl IntoCondition>);
        group_by(fields: impl IntoIterator<Item = impl IntoColumn>);
        having(conds: impl IntoIterator<Item = impl IntoCondition>);
        order_by(sorts: impl IntoIterator<Item = impl IntoColumn>);
        lock(lock: Lock);
    }

    /// 展开为等价的 [`FindActions`]。
    pub fn to_find(&self) -> FindActions {
        let mut act = self.inner.clone();
        act.count = 1;
        act.skip = 0;
        act
    }
}

/// 基于游标（keyset）的分页查询。
///
/// `after` 接收上一页最后一条记录在各排序列上的值，生成
/// `a > ? OR (a = ? AND b > ?) ...` 形式的条件（降序列使用 `<`）。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginateActions {
    inner: FindActions,
    cursor: Vec<Expr>,
}

pub fn paginate() -> PaginateActions {
    PaginateActions::default()
}

impl PaginateActions {
    forward_actions! {
        from(table: impl Into<String>);
        database(database: impl Into<String>);
        select(fields: impl IntoIterator<Item = impl IntoColumn>);
        where_(conds: impl IntoIterator<Item = impl IntoCondition>);
        order_by(sorts: impl IntoIterator<Item = impl IntoColumn>);
        /// 每页条数。
        limit(n: u64);
        lock(lock: Lock);
    }

    pub fn after(&mut self, cursor: impl IntoIterator<Item = impl IntoValue>) -> &mut Self {
        self.cursor = cursor.into_iter().map(IntoValue::into_value).collect();
        self
    }

    fn keyset(&self) -> Expr {
        let keys: Vec<(Expr, Order)> = self
            .inner
            .sorts
            .iter()
            .map(|s| match s {
                Expr::Sort(Sort { field, order }) => ((**field).clone(), *order),
                other => (other.clone(), Order::Ascending),
            })
            .zip(self.cursor.iter())
            .map(|(k, _)| k)
            .collect();

        let mut branches = Vec::with_capacity(keys.len());
        for (i, (field, order)) in keys.iter().enumerate() {
            let mut conds: Vec<Expr> = keys[..i]
                .iter()
                .zip(self.cursor.iter())
                .map(|((f, _), v)| equal(f.clone(), v.clone()))
                .collect();
            let v = self.cursor[i].clone();
            conds.push(match order {
                Order::Ascending => greater_than(field.clone(), v),
                Order::Descending => lower_than(field.clone(), v),
            });
            branches.push(and(conds));
        }
        or(branches)
    }

    /// 展开为等价的 [`FindActions`]：原有条件与游标条件按 AND 合并。
    pub fn to_find(&self) -> FindActions {
        let mut act = self.inner.clone();
        act.conditions = and([act.conditions.clone(), self.keyset()]);
        act
    }
}

/// UPDATE 语句的累加器。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateActions {
    pub database: String,
    pub table: String,
    pub conditions: Expr,
    pub values: Vec<Expr>,
    pub sorts: Vec<Expr>,
    pub count: u64,
}

pub fn update() -> UpdateActions {
    UpdateActions::default()
}

impl UpdateActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = table.into();
        self
    }

    pub fn database(&mut self, database: impl Into<String>) -> &mut Self {
        self.database = database.into();
        self
    }

    pub fn where_(&mut self, conds: impl IntoIterator<Item = impl IntoCondition>) -> &mut Self {
        self.conditions = and(conds);
        self
    }

    /// 追加 SET 项：[`column_value`](crate::expr::column_value)、
    /// [`increment`](crate::expr::increment)、[`decrement`](crate::expr::decrement)。
    pub fn set(&mut self, values: impl IntoIterator<Item = Expr>) -> &mut Self {
        self.values.extend(values);
        self
    }

    pub fn order_by(&mut self, sorts: impl IntoIterator<Item = impl IntoColumn>) -> &mut Self {
        self.sorts = sorts
            .into_iter()
            .map(|s| into_sort(s.into_column()))
            .collect();
        self
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.count = n;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOneActions {
    inner: UpdateActions,
}

pub fn update_one() -> UpdateOneActions {
    UpdateOneActions::default()
}

impl UpdateOneActions {
    forward_actions! {
        table(table: impl Into<String>);
        database(database: impl Into<String>);
        where_(conds: impl IntoIterator<Item = impl IntoCondition>);
        set(values: impl IntoIterator<Item = Expr>);
        order_by(sorts: impl IntoIterator<Item = impl IntoColumn>);
    }

    pub fn to_update(&self) -> UpdateActions {
        let mut act = self.inner.clone();
        act.count = 1;
        act
    }
}

/// DELETE 语句的累加器。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteActions {
    pub database: String,
    pub table: String,
    pub conditions: Expr,
    pub sorts: Vec<Expr>,
    pub count: u64,
}

pub fn delete() -> DeleteActions {
    DeleteActions::default()
}

impl DeleteActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = table.into();
        self
    }

    pub fn database(&mut self, database: impl Into<String>) -> &mut Self {
        self.database = database.into();
        self
    }

    pub fn where_(&mut self, conds: impl IntoIterator<Item = impl IntoCondition>) -> &mut Self {
        self.conditions = and(conds);
        self
    }

    pub fn order_by(&mut self, sorts: impl IntoIterator<Item = impl IntoColumn>) -> &mut Self {
        self.sorts = sorts
            .into_iter()
            .map(|s| into_sort(s.into_column()))
            .collect();
        self
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.count = n;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOneActions {
    inner: DeleteActions,
}

pub fn delete_one() -> DeleteOneActions {
    DeleteOneActions::default()
}

impl DeleteOneActions {
    forward_actions! {
        from(table: impl Into<String>);
        database(database: impl Into<String>);
        where_(conds: impl IntoIterator<Item = impl IntoCondition>);
        order_by(sorts: impl IntoIterator<Item = impl IntoColumn>);
    }

    pub fn to_delete(&self) -> DeleteActions {
        let mut act = self.inner.clone();
        act.count = 1;
        act
    }
}

/// INSERT 语句的累加器。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertActions {
    pub database: String,
    pub table: String,
    pub ignore: bool,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Expr>>,
    /// `Some(vec![])` 表示冲突时更新全部插入列。
    pub on_duplicate: Option<Vec<String>>,
    pub omit: Vec<String>,
}

pub fn insert() -> InsertActions {
    InsertActions::default()
}

impl InsertActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_table(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = table.into();
        self
    }

    pub fn database(&mut self, database: impl Into<String>) -> &mut Self {
        self.database = database.into();
        self
    }

    /// `INSERT IGNORE`。
    pub fn ignore(&mut self) -> &mut Self {
        self.ignore = true;
        self
    }

    pub fn columns(&mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// 追加一行值，顺序与 `columns` 一致。
    pub fn values(&mut self, row: impl IntoIterator<Item = impl IntoValue>) -> &mut Self {
        self.rows
            .push(row.into_iter().map(IntoValue::into_value).collect());
        self
    }

    /// `records` 生成列时跳过的列名。
    pub fn omit_fields(&mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.omit = fields.into_iter().map(Into::into).collect();
        self
    }

    /// `ON DUPLICATE KEY UPDATE`；不给列名时更新全部插入列。
    pub fn on_duplicate_key_update(
        &mut self,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        self.on_duplicate = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// 从 struct 值生成列与行：列取自 `codec.properties()`，跳过 `omit_fields` 中的列。
    ///
    /// JSON 列内部的生成列不是 property，不会出现在这里。
    pub fn records<T: Reflect>(&mut self, codec: &Struct, rows: &[T]) -> &mut Self {
        let keep: Vec<bool> = codec
            .properties()
            .iter()
            .map(|sf| !self.omit.iter().any(|o| o == sf.name()))
            .collect();
        self.columns = codec
            .properties()
            .iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(sf, _)| sf.name().to_string())
            .collect();
        for row in rows {
            let values = codec
                .values_of(row)
                .into_iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| v.into_value())
                .collect();
            self.rows.push(values);
        }
        self
    }
}
