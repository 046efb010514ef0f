//! StatementBuilder：按节点种类分发渲染函数的语句编译器。
//!
//! 每种 [`ExprKind`] 在构造时注册一个渲染函数；渲染函数向共享的 [`Statement`] 写入 SQL 片段
//! 并按输出顺序追加参数。[`Expr::Arg`] 没有注册渲染函数时按绑定参数处理：写占位符，
//! 值经过按 [`ValueKind`] 注册的编码器后追加到参数列表。

use crate::dialect::Dialect;
use crate::modifiers::Arg;
use crate::primitive::{Expr, ExprKind};
use crate::string_builder::StringBuilder;
use crate::value::{SqlValue, ValueKind};
use crate::valuer::ValuerError;
use std::collections::HashMap;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("builder {op}: no renderer registered for {kind} expression")]
    UnregisteredExpr { kind: ExprKind, op: &'static str },
    #[error("builder no encoder registered for {0} value")]
    NoEncoder(ValueKind),
    #[error("builder {0}: empty table name")]
    EmptyTable(&'static str),
    #[error("builder {0}: nothing to write")]
    EmptyValues(&'static str),
    #[error("{0}")]
    Valuer(#[from] ValuerError),
    #[error("builder json encoding: {0}")]
    Json(String),
    #[error("builder time formatting: {0}")]
    Format(String),
}

/// 渲染函数。
pub type RenderFn = fn(&StatementBuilder, &mut Statement, &Expr) -> Result<(), BuildError>;

/// 参数编码函数。
pub type EncodeFn = fn(SqlValue) -> Result<SqlValue, BuildError>;

/// 一次编译的输出：SQL 文本与位置参数。
#[derive(Debug)]
pub struct Statement {
    op: &'static str,
    dialect: Dialect,
    buf: StringBuilder,
    args: Vec<SqlValue>,
}

impl Statement {
    pub fn new(dialect: Dialect, op: &'static str) -> Self {
        Self {
            op,
            dialect,
            buf: StringBuilder::new(),
            args: Vec::new(),
        }
    }

    /// 正在编译的语句名（用于错误信息）。
    pub fn op(&self) -> &'static str {
        self.op
    }

    pub fn write_str(&mut self, s: &str) {
        self.buf.write_str(s);
    }

    pub fn write_char(&mut self, c: char) {
        self.buf.write_char(c);
    }

    /// 写入引用后的标识符。
    pub fn write_quoted(&mut self, name: &str) {
        let quoted = self.dialect.quote(name);
        self.buf.write_str(&quoted);
    }

    /// 写入 `db`.`table`。
    pub fn write_table(&mut self, database: &str, table: &str) {
        let quoted = self.dialect.quote_table(database, table);
        self.buf.write_str(&quoted);
    }

    /// 写入占位符并追加参数。
    pub fn bind(&mut self, value: SqlValue) {
        self.buf.write_str(self.dialect.placeholder());
        self.args.push(value);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.len() == 0
    }

    pub fn sql(&self) -> &str {
        self.buf.as_str()
    }

    pub fn args(&self) -> &[SqlValue] {
        &self.args
    }

    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.buf.into_string(), self.args)
    }
}

/// 渲染注册表与编码器注册表。
#[derive(Clone)]
pub struct StatementBuilder {
    dialect: Dialect,
    renderers: HashMap<ExprKind, RenderFn>,
    encoders: HashMap<ValueKind, EncodeFn>,
}

impl std::fmt::Debug for StatementBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<String> = self.renderers.keys().map(|k| k.to_string()).collect();
        kinds.sort();
        f.debug_struct("StatementBuilder")
            .field("dialect", &self.dialect)
            .field("renderers", &kinds)
            .field("encoders", &self.encoders.len())
            .finish()
    }
}

impl StatementBuilder {
    /// 空注册表；方言负责填充。
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            renderers: HashMap::new(),
            encoders: HashMap::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// 注册渲染函数，返回被替换的旧值。
    pub fn set_renderer(&mut self, kind: ExprKind, f: RenderFn) -> Option<RenderFn> {
        self.renderers.insert(kind, f)
    }

    /// 注册参数编码器，返回被替换的旧值。
    pub fn set_encoder(&mut self, kind: ValueKind, f: EncodeFn) -> Option<EncodeFn> {
        self.encoders.insert(kind, f)
    }

    pub fn has_renderer(&self, kind: ExprKind) -> bool {
        self.renderers.contains_key(&kind)
    }

    pub fn statement(&self, op: &'static str) -> Statement {
        Statement::new(self.dialect, op)
    }

    /// 渲染一个节点。
    pub fn build_expr(&self, stmt: &mut Statement, expr: &Expr) -> Result<(), BuildError> {
        if let Some(render) = self.renderers.get(&expr.kind()) {
            return render(self, stmt, expr);
        }
        match expr {
            Expr::Arg(arg) => self.write_arg(stmt, arg),
            other => Err(BuildError::UnregisteredExpr {
                kind: other.kind(),
                op: stmt.op(),
            }),
        }
    }

    /// 依次渲染，节点之间写入 `sep`。
    pub fn build_exprs(
        &self,
        stmt: &mut Statement,
        exprs: &[Expr],
        sep: &str,
    ) -> Result<(), BuildError> {
        for (i, e) in exprs.iter().enumerate() {
            if i > 0 {
                stmt.write_str(sep);
            }
            self.build_expr(stmt, e)?;
        }
        Ok(())
    }

    /// 写入一个绑定参数。
    pub fn write_arg(&self, stmt: &mut Statement, arg: &Arg) -> Result<(), BuildError> {
        let value = match arg {
            Arg::Value(v) => v.clone(),
            Arg::Valuer(v) => v.value()?,
        };
        let value = self.encode(value)?;
        stmt.bind(value);
        Ok(())
    }

    /// 按值种类编码。
    pub fn encode(&self, value: SqlValue) -> Result<SqlValue, BuildError> {
        match self.encoders.get(&value.kind()) {
            Some(encode) => encode(value),
            None => Err(BuildError::NoEncoder(value.kind())),
        }
    }
}
