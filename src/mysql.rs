//! MySQL 方言：渲染函数集、参数编码器以及各类语句的拼装顺序。

use crate::actions::{
    DeleteActions, DeleteOneActions, FindActions, FindOneActions, InsertActions,
    PaginateActions, UpdateActions, UpdateOneActions,
};
use crate::builder::{BuildError, Statement, StatementBuilder};
use crate::dialect::Dialect;
use crate::primitive::{AggregateBy, Expr, ExprKind, LockMode, LockOption, MathMode, Operator, Order};
use crate::value::{SqlValue, ValueKind};
use std::ops::Deref;

/// 只有 OFFSET 没有 LIMIT 时使用的上限（MySQL 文档中的写法）。
const MAX_LIMIT: u64 = u64::MAX;

const DATETIME_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] = time::macros::format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
);
const DATE_FORMAT: &[time::format_description::BorrowedFormatItem<'static>] =
    time::macros::format_description!("[year]-[month]-[day]");

/// 可以被编译成一条 MySQL 语句的 action。
pub trait Compile {
    /// 语句名，用于错误信息与日志。
    const OP: &'static str;

    fn compile(&self, b: &StatementBuilder, stmt: &mut Statement) -> Result<(), BuildError>;
}

/// MySQL 语句编译器。
#[derive(Debug, Clone)]
pub struct MySqlBuilder {
    inner: StatementBuilder,
}

impl Default for MySqlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for MySqlBuilder {
    type Target = StatementBuilder;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl MySqlBuilder {
    pub fn new() -> Self {
        let mut b = StatementBuilder::new(Dialect::MySQL);
        b.set_renderer(ExprKind::Column, render_column);
        b.set_renderer(ExprKind::Clause, render_clause);
        b.set_renderer(ExprKind::Like, render_like);
        b.set_renderer(ExprKind::Nil, render_nil);
        b.set_renderer(ExprKind::Range, render_range);
        b.set_renderer(ExprKind::Group, render_group);
        b.set_renderer(ExprKind::Sort, render_sort);
        b.set_renderer(ExprKind::KV, render_kv);
        b.set_renderer(ExprKind::Math, render_math);
        b.set_renderer(ExprKind::Aggregate, render_aggregate);
        b.set_renderer(ExprKind::Func, render_func);
        b.set_renderer(ExprKind::JsonFunc, render_json_func);
        b.set_renderer(ExprKind::Lock, render_lock);
        b.set_renderer(ExprKind::Raw, render_raw);
        b.set_renderer(ExprKind::As, render_as);
        b.set_renderer(ExprKind::CastAs, render_cast_as);
        b.set_renderer(ExprKind::Values, render_values);
        b.set_renderer(ExprKind::Exists, render_exists);
        b.set_renderer(ExprKind::Select, render_select);

        for kind in [
            ValueKind::Null,
            ValueKind::I64,
            ValueKind::U64,
            ValueKind::F64,
            ValueKind::String,
            ValueKind::Bytes,
        ] {
            b.set_encoder(kind, encode_passthrough);
        }
        b.set_encoder(ValueKind::Bool, encode_bool);
        b.set_encoder(ValueKind::DateTime, encode_datetime);
        b.set_encoder(ValueKind::Date, encode_date);
        b.set_encoder(ValueKind::Json, encode_json);
        Self { inner: b }
    }

    /// 替换或补充某类节点的渲染函数。
    pub fn set_renderer(&mut self, kind: ExprKind, f: crate::builder::RenderFn) -> &mut Self {
        self.inner.set_renderer(kind, f);
        self
    }

    /// 替换或补充某类值的编码器。
    pub fn set_encoder(&mut self, kind: ValueKind, f: crate::builder::EncodeFn) -> &mut Self {
        self.inner.set_encoder(kind, f);
        self
    }

    /// 编译一条语句，返回 SQL 文本与按占位符顺序排列的参数。
    pub fn build<A: Compile>(&self, act: &A) -> Result<(String, Vec<SqlValue>), BuildError> {
        let mut stmt = self.inner.statement(A::OP);
        act.compile(&self.inner, &mut stmt)?;
        let (sql, args) = stmt.into_parts();
        log::trace!("mysql {}: {} ({} args)", A::OP, sql, args.len());
        Ok((sql, args))
    }

    /// 单独编译一个表达式片段。
    pub fn build_expr_sql(&self, expr: &Expr) -> Result<(String, Vec<SqlValue>), BuildError> {
        let mut stmt = self.inner.statement("expr");
        self.inner.build_expr(&mut stmt, expr)?;
        Ok(stmt.into_parts())
    }
}

fn encode_passthrough(v: SqlValue) -> Result<SqlValue, BuildError> {
    Ok(v)
}

fn encode_bool(v: SqlValue) -> Result<SqlValue, BuildError> {
    match v {
        SqlValue::Bool(b) => Ok(SqlValue::I64(i64::from(b))),
        other => Ok(other),
    }
}

fn encode_datetime(v: SqlValue) -> Result<SqlValue, BuildError> {
    match v {
        SqlValue::DateTime(dt) => dt
            .to_offset(time::UtcOffset::UTC)
            .format(DATETIME_FORMAT)
            .map(SqlValue::from)
            .map_err(|e| BuildError::Format(e.to_string())),
        other => Ok(other),
    }
}

fn encode_date(v: SqlValue) -> Result<SqlValue, BuildError> {
    match v {
        SqlValue::Date(d) => d
            .format(DATE_FORMAT)
            .map(SqlValue::from)
            .map_err(|e| BuildError::Format(e.to_string())),
        other => Ok(other),
    }
}

fn encode_json(v: SqlValue) -> Result<SqlValue, BuildError> {
    match v {
        SqlValue::Json(j) => serde_json::to_string(&j)
            .map(SqlValue::from)
            .map_err(|e| BuildError::Json(e.to_string())),
        other => Ok(other),
    }
}

fn render_column(_: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    let Expr::Column(c) = expr else {
        return Ok(());
    };
    if !c.table.is_empty() {
        stmt.write_quoted(&c.table);
        stmt.write_char('.');
    }
    if c.name == "*" {
        stmt.write_char('*');
    } else {
        stmt.write_quoted(&c.name);
    }
    Ok(())
}

fn render_clause(b: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    let Expr::Clause(c) = expr else {
        return Ok(());
    };
    if c.operator == Operator::MemberOf {
        b.build_expr(stmt, &c.value)?;
        stmt.write_str(" MEMBER OF(");
        b.build_expr(stmt, &c.field)?;
        stmt.write_char(')');
        return Ok(());
    }
    b.build_expr(stmt, &c.field)?;
    stmt.write_char(' ');
    stmt.write_str(c.operator.as_str());
    stmt.write_char(' ');
    b.build_expr(stmt, &c.value)
}

fn render_like(b: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    let Expr::Like(l) = expr else {
        return Ok(());
    };
    b.build_expr(stmt, &l.field)?;
    stmt.write_str(if l.is_not { " NOT LIKE " } else { " LIKE " });
    b.build_expr(stmt, &l.value)
}

fn render_nil(b: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    let Expr::Nil(n) = expr else {
        return Ok(());
    };
    b.build_expr(stmt, &n.field)?;
    stmt.write_str(if n.is_not { " IS NOT NULL" } else { " IS NULL" });
    Ok(())
}

fn render_range(b: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    let Expr::Range(r) = expr else {
        return Ok(());
    };
    b.build_expr(stmt, &r.from)?;
    stmt.write_str(" AND ");
    b.build_expr(stmt, &r.to)
}

fn render_group(b: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    let Expr::Group(g) = expr else {
        return Ok(());
    };
    for v in &g.values {
        b.build_expr(stmt, v)?;
    }
    Ok(())
}

fn render_sort(b: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    let Expr::Sort(s) = expr else {
        return Ok(());
    };
    b.build_expr(stmt, &s.field)?;
    if s.order == Order::Descending {
        stmt.write_str(" DESC");
    }
    Ok(())
}

fn render_kv(b: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    let Expr::KV(kv) = expr else {
        return Ok(());
    };
    b.build_expr(stmt, &kv.field)?;
    stmt.write_str(" = ");
    b.build_expr(stmt, &kv.value)
}

fn render_math(b: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    let Expr::Math(m) = expr else {
        return Ok(());
    };
    b.build_expr(stmt, &m.field)?;
    stmt.write_str(" = ");
    b.build_expr(stmt, &m.field)?;
    stmt.write_str(match m.mode {
        MathMode::Add => " + ",
        MathMode::Subtract => " - ",
    });
    b.build_expr(stmt, &m.value)
}

fn render_aggregate(
    b: &StatementBuilder,
    stmt: &mut Statement,
    expr: &Expr,
) -> Result<(), BuildError> {
    let Expr::Aggregate(a) = expr else {
        return Ok(());
    };
    stmt.write_str(match a.by {
        AggregateBy::Count => "COUNT(",
        AggregateBy::CountDistinct => "COUNT(DISTINCT ",
        AggregateBy::Sum => "SUM(",
        AggregateBy::Average => "AVG(",
        AggregateBy::Max => "MAX(",
        AggregateBy::Min => "MIN(",
    });
    b.build_expr(stmt, &a.field)?;
    stmt.write_char(')');
    Ok(())
}

fn render_func(b: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    let Expr::Func(f) = expr else {
        return Ok(());
    };
    stmt.write_str(&f.name);
    stmt.write_char('(');
    b.build_exprs(stmt, &f.args, ",")?;
    stmt.write_char(')');
    Ok(())
}

fn render_json_func(
    b: &StatementBuilder,
    stmt: &mut Statement,
    expr: &Expr,
) -> Result<(), BuildError> {
    let Expr::JsonFunc(f) = expr else {
        return Ok(());
    };
    stmt.write_str(f.name);
    stmt.write_char('(');
    b.build_exprs(stmt, &f.args, ",")?;
    stmt.write_char(')');
    Ok(())
}

fn render_lock(_: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    let Expr::Lock(l) = expr else {
        return Ok(());
    };
    stmt.write_str(match l.mode {
        LockMode::ForUpdate => "FOR UPDATE",
        LockMode::ForShare => "FOR SHARE",
        LockMode::LockInShareMode => "LOCK IN SHARE MODE",
    });
    // LOCK IN SHARE MODE 不支持 NOWAIT/SKIP LOCKED
    if l.mode != LockMode::LockInShareMode {
        match l.option {
            Some(LockOption::NoWait) => stmt.write_str(" NOWAIT"),
            Some(LockOption::SkipLocked) => stmt.write_str(" SKIP LOCKED"),
            None => {}
        }
    }
    Ok(())
}

fn render_raw(_: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    if let Expr::Raw(r) = expr {
        stmt.write_str(&r.value);
    }
    Ok(())
}

fn render_as(b: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    let Expr::As(a) = expr else {
        return Ok(());
    };
    b.build_expr(stmt, &a.field)?;
    stmt.write_str(" AS ");
    stmt.write_quoted(&a.alias);
    Ok(())
}

fn render_cast_as(
    b: &StatementBuilder,
    stmt: &mut Statement,
    expr: &Expr,
) -> Result<(), BuildError> {
    let Expr::CastAs(c) = expr else {
        return Ok(());
    };
    stmt.write_str("CAST(");
    b.build_expr(stmt, &c.value)?;
    stmt.write_str(" AS ");
    stmt.write_str(c.data_type.as_str());
    stmt.write_char(')');
    Ok(())
}

fn render_values(b: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    let Expr::Values(v) = expr else {
        return Ok(());
    };
    stmt.write_char('(');
    b.build_exprs(stmt, &v.values, ",")?;
    stmt.write_char(')');
    Ok(())
}

fn render_exists(b: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    let Expr::Exists(e) = expr else {
        return Ok(());
    };
    stmt.write_str(if e.is_not { "NOT EXISTS (" } else { "EXISTS (" });
    write_find(b, stmt, &e.query)?;
    stmt.write_char(')');
    Ok(())
}

fn render_select(b: &StatementBuilder, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
    let Expr::Select(act) = expr else {
        return Ok(());
    };
    stmt.write_char('(');
    write_find(b, stmt, act)?;
    stmt.write_char(')');
    Ok(())
}

fn write_table(stmt: &mut Statement, database: &str, table: &str) -> Result<(), BuildError> {
    if table.is_empty() {
        return Err(BuildError::EmptyTable(stmt.op()));
    }
    stmt.write_table(database, table);
    Ok(())
}

fn write_where(b: &StatementBuilder, stmt: &mut Statement, conds: &Expr) -> Result<(), BuildError> {
    if conds.is_zero() {
        return Ok(());
    }
    stmt.write_str(" WHERE ");
    b.build_expr(stmt, conds)
}

fn write_order_by(
    b: &StatementBuilder,
    stmt: &mut Statement,
    sorts: &[Expr],
) -> Result<(), BuildError> {
    if sorts.is_empty() {
        return Ok(());
    }
    stmt.write_str(" ORDER BY ");
    b.build_exprs(stmt, sorts, ",")
}

fn write_limit(stmt: &mut Statement, count: u64, skip: u64) {
    if count > 0 {
        stmt.write_str(&format!(" LIMIT {count}"));
    }
    if skip > 0 {
        if count == 0 {
            stmt.write_str(&format!(" LIMIT {MAX_LIMIT}"));
        }
        stmt.write_str(&format!(" OFFSET {skip}"));
    }
}

pub(crate) fn write_find(
    b: &StatementBuilder,
    stmt: &mut Statement,
    act: &FindActions,
) -> Result<(), BuildError> {
    stmt.write_str("SELECT ");
    if act.distinct {
        stmt.write_str("DISTINCT ");
    }
    if act.projections.is_empty() {
        stmt.write_char('*');
    } else {
        b.build_exprs(stmt, &act.projections, ",")?;
    }
    stmt.write_str(" FROM ");
    write_table(stmt, &act.database, &act.table)?;

    for join in &act.joins {
        stmt.write_char(' ');
        stmt.write_str(join.kind.as_str());
        stmt.write_char(' ');
        write_table(stmt, &act.database, &join.table)?;
        if !join.alias.is_empty() {
            stmt.write_str(" AS ");
            stmt.write_quoted(&join.alias);
        }
        if !join.on.is_zero() {
            stmt.write_str(" ON ");
            b.build_expr(stmt, &join.on)?;
        }
    }

    write_where(b, stmt, &act.conditions)?;
    if !act.group_bys.is_empty() {
        stmt.write_str(" GROUP BY ");
        b.build_exprs(stmt, &act.group_bys, ",")?;
    }
    if !act.having.is_zero() {
        stmt.write_str(" HAVING ");
        b.build_expr(stmt, &act.having)?;
    }
    write_order_by(b, stmt, &act.sorts)?;
    write_limit(stmt, act.count, act.skip);
    if let Some(lock) = act.lock {
        stmt.write_char(' ');
        b.build_expr(stmt, &Expr::Lock(lock))?;
    }
    Ok(())
}

fn write_update(
    b: &StatementBuilder,
    stmt: &mut Statement,
    act: &UpdateActions,
) -> Result<(), BuildError> {
    stmt.write_str("UPDATE ");
    write_table(stmt, &act.database, &act.table)?;
    if act.values.is_empty() {
        return Err(BuildError::EmptyValues(stmt.op()));
    }
    stmt.write_str(" SET ");
    b.build_exprs(stmt, &act.values, ",")?;
    write_where(b, stmt, &act.conditions)?;
    write_order_by(b, stmt, &act.sorts)?;
    write_limit(stmt, act.count, 0);
    Ok(())
}

fn write_delete(
    b: &StatementBuilder,
    stmt: &mut Statement,
    act: &DeleteActions,
) -> Result<(), BuildError> {
    stmt.write_str("DELETE FROM ");
    write_table(stmt, &act.database, &act.table)?;
    write_where(b, stmt, &act.conditions)?;
    write_order_by(b, stmt, &act.sorts)?;
    write_limit(stmt, act.count, 0);
    Ok(())
}

fn write_insert(
    b: &StatementBuilder,
    stmt: &mut Statement,
    act: &InsertActions,
) -> Result<(), BuildError> {
    stmt.write_str(if act.ignore {
        "INSERT IGNORE INTO "
    } else {
        "INSERT INTO "
    });
    write_table(stmt, &act.database, &act.table)?;
    if act.columns.is_empty() || act.rows.is_empty() {
        return Err(BuildError::EmptyValues(stmt.op()));
    }

    stmt.write_str(" (");
    for (i, c) in act.columns.iter().enumerate() {
        if i > 0 {
            stmt.write_char(',');
        }
        stmt.write_quoted(c);
    }
    stmt.write_str(") VALUES ");
    for (i, row) in act.rows.iter().enumerate() {
        if i > 0 {
            stmt.write_char(',');
        }
        stmt.write_char('(');
        b.build_exprs(stmt, row, ",")?;
        stmt.write_char(')');
    }

    if let Some(cols) = &act.on_duplicate {
        let cols = if cols.is_empty() { &act.columns } else { cols };
        stmt.write_str(" ON DUPLICATE KEY UPDATE ");
        for (i, c) in cols.iter().enumerate() {
            if i > 0 {
                stmt.write_char(',');
            }
            stmt.write_quoted(c);
            stmt.write_str(" = VALUES(");
            stmt.write_quoted(c);
            stmt.write_char(')');
        }
    }
    Ok(())
}

impl Compile for FindActions {
    const OP: &'static str = "find";

    fn compile(&self, b: &StatementBuilder, stmt: &mut Statement) -> Result<(), BuildError> {
        write_find(b, stmt, self)
    }
}

impl Compile for FindOneActions {
    const OP: &'static str = "find_one";

    fn compile(&self, b: &StatementBuilder, stmt: &mut Statement) -> Result<(), BuildError> {
        write_find(b, stmt, &self.to_find())
    }
}

impl Compile for PaginateActions {
    const OP: &'static str = "paginate";

    fn compile(&self, b: &StatementBuilder, stmt: &mut Statement) -> Result<(), BuildError> {
        write_find(b, stmt, &self.to_find())
    }
}

impl Compile for UpdateActions {
    const OP: &'static str = "update";

    fn compile(&self, b: &StatementBuilder, stmt: &mut Statement) -> Result<(), BuildError> {
        write_update(b, stmt, self)
    }
}

impl Compile for UpdateOneActions {
    const OP: &'static str = "update_one";

    fn compile(&self, b: &StatementBuilder, stmt: &mut Statement) -> Result<(), BuildError> {
        write_update(b, stmt, &self.to_update())
    }
}

impl Compile for DeleteActions {
    const OP: &'static str = "delete";

    fn compile(&self, b: &StatementBuilder, stmt: &mut Statement) -> Result<(), BuildError> {
        write_delete(b, stmt, self)
    }
}

impl Compile for DeleteOneActions {
    const OP: &'static str = "delete_one";

    fn compile(&self, b: &StatementBuilder, stmt: &mut Statement) -> Result<(), BuildError> {
        write_delete(b, stmt, &self.to_delete())
    }
}

impl Compile for InsertActions {
    const OP: &'static str = "insert";

    fn compile(&self, b: &StatementBuilder, stmt: &mut Statement) -> Result<(), BuildError> {
        write_insert(b, stmt, self)
    }
}
