//! 表达式 IR：一组封闭的 SQL 片段节点。
//!
//! 节点只描述结构，不包含任何方言文本；渲染由 [`StatementBuilder`](crate::builder::StatementBuilder)
//! 按 [`ExprKind`] 查表完成。不是 IR 节点的值统一包成 [`Expr::Arg`]，编译时成为绑定参数。

use crate::actions::FindActions;
use crate::modifiers::Arg;
use crate::value::SqlValue;
use crate::valuer::SqlValuer;

/// 节点种类标签，渲染注册表的 key。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    Column,
    Clause,
    Like,
    Nil,
    Range,
    Group,
    Sort,
    KV,
    Math,
    Aggregate,
    Func,
    JsonFunc,
    Lock,
    Raw,
    As,
    CastAs,
    Values,
    Exists,
    Select,
    Arg,
}

impl std::fmt::Display for ExprKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// 列引用，`table` 为空时不加表前缀。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Column {
    pub table: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LowerThan,
    LowerOrEqual,
    In,
    NotIn,
    Between,
    NotBetween,
    MemberOf,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
            Self::LowerThan => "<",
            Self::LowerOrEqual => "<=",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT BETWEEN",
            Self::MemberOf => "MEMBER OF",
        }
    }
}

/// 二元比较：`field op value`。
#[derive(Debug, Clone, PartialEq)]
pub struct C {
    pub field: Box<Expr>,
    pub operator: Operator,
    pub value: Box<Expr>,
}

/// `field [NOT] LIKE value`。
#[derive(Debug, Clone, PartialEq)]
pub struct L {
    pub field: Box<Expr>,
    pub is_not: bool,
    pub value: Box<Expr>,
}

/// `field IS [NOT] NULL`。
#[derive(Debug, Clone, PartialEq)]
pub struct Nil {
    pub field: Box<Expr>,
    pub is_not: bool,
}

/// BETWEEN 的区间。
#[derive(Debug, Clone, PartialEq)]
pub struct R {
    pub from: Box<Expr>,
    pub to: Box<Expr>,
}

/// 有序的子表达式序列，连接符与括号以 `Raw` 的形式存放在 `values` 中。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: Box<Expr>,
    pub order: Order,
}

/// UPDATE SET 的赋值。
#[derive(Debug, Clone, PartialEq)]
pub struct KV {
    pub field: Box<Expr>,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathMode {
    Add,
    Subtract,
}

/// `field = field + value` / `field = field - value`。
#[derive(Debug, Clone, PartialEq)]
pub struct Math {
    pub field: Box<Expr>,
    pub mode: MathMode,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateBy {
    Count,
    CountDistinct,
    Sum,
    Average,
    Max,
    Min,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub field: Box<Expr>,
    pub by: AggregateBy,
}

/// 普通函数调用 `NAME(arg,...)`。
#[derive(Debug, Clone, PartialEq)]
pub struct Func {
    pub name: String,
    pub args: Vec<Expr>,
}

/// JSON 函数调用，JSON path 等字符串参数以绑定参数传递。
#[derive(Debug, Clone, PartialEq)]
pub struct JsonFunc {
    pub name: &'static str,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    ForUpdate,
    ForShare,
    LockInShareMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOption {
    NoWait,
    SkipLocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lock {
    pub mode: LockMode,
    pub option: Option<LockOption>,
}

impl Lock {
    pub fn no_wait(mut self) -> Self {
        self.option = Some(LockOption::NoWait);
        self
    }

    pub fn skip_locked(mut self) -> Self {
        self.option = Some(LockOption::SkipLocked);
        self
    }
}

/// 原样输出的 SQL 片段，不做任何引用或转义。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Raw {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct As {
    pub field: Box<Expr>,
    pub alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Binary,
    Char,
    Date,
    DateTime,
    Decimal,
    Json,
    Signed,
    Unsigned,
    Time,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "BINARY",
            Self::Char => "CHAR",
            Self::Date => "DATE",
            Self::DateTime => "DATETIME",
            Self::Decimal => "DECIMAL",
            Self::Json => "JSON",
            Self::Signed => "SIGNED",
            Self::Unsigned => "UNSIGNED",
            Self::Time => "TIME",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastAs {
    pub value: Box<Expr>,
    pub data_type: DataType,
}

/// 括号包裹、逗号分隔的值列表 `(a,b,...)`。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exists {
    pub is_not: bool,
    pub query: Box<FindActions>,
}

/// 表达式节点。
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(Column),
    Clause(C),
    Like(L),
    Nil(Nil),
    Range(R),
    Group(Group),
    Sort(Sort),
    KV(KV),
    Math(Math),
    Aggregate(Aggregate),
    Func(Func),
    JsonFunc(JsonFunc),
    Lock(Lock),
    Raw(Raw),
    As(As),
    CastAs(CastAs),
    Values(Values),
    Exists(Exists),
    /// 子查询。
    Select(Box<FindActions>),
    /// 绑定参数。
    Arg(Arg),
}

impl Expr {
    pub fn kind(&self) -> ExprKind {
        match self {
            Self::Column(_) => ExprKind::Column,
            Self::Clause(_) => ExprKind::Clause,
            Self::Like(_) => ExprKind::Like,
            Self::Nil(_) => ExprKind::Nil,
            Self::Range(_) => ExprKind::Range,
            Self::Group(_) => ExprKind::Group,
            Self::Sort(_) => ExprKind::Sort,
            Self::KV(_) => ExprKind::KV,
            Self::Math(_) => ExprKind::Math,
            Self::Aggregate(_) => ExprKind::Aggregate,
            Self::Func(_) => ExprKind::Func,
            Self::JsonFunc(_) => ExprKind::JsonFunc,
            Self::Lock(_) => ExprKind::Lock,
            Self::Raw(_) => ExprKind::Raw,
            Self::As(_) => ExprKind::As,
            Self::CastAs(_) => ExprKind::CastAs,
            Self::Values(_) => ExprKind::Values,
            Self::Exists(_) => ExprKind::Exists,
            Self::Select(_) => ExprKind::Select,
            Self::Arg(_) => ExprKind::Arg,
        }
    }

    /// 未构造的“零值”节点：空 Group、空 Raw、无名列、无名函数。
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Group(g) => g.values.is_empty(),
            Self::Raw(r) => r.value.is_empty(),
            Self::Column(c) => c.name.is_empty(),
            Self::Func(f) => f.name.is_empty(),
            _ => false,
        }
    }
}

/// 默认值是空 Group（零值，渲染为空）。
impl Default for Expr {
    fn default() -> Self {
        Self::Group(Group::default())
    }
}

impl From<Column> for Expr {
    fn from(v: Column) -> Self {
        Self::Column(v)
    }
}

impl From<Group> for Expr {
    fn from(v: Group) -> Self {
        Self::Group(v)
    }
}

impl From<Raw> for Expr {
    fn from(v: Raw) -> Self {
        Self::Raw(v)
    }
}

impl From<Lock> for Expr {
    fn from(v: Lock) -> Self {
        Self::Lock(v)
    }
}

/// 左操作数（列位置）的转换：字符串视为列名，其它表达式原样传递。
pub trait IntoColumn {
    fn into_column(self) -> Expr;
}

impl IntoColumn for &str {
    fn into_column(self) -> Expr {
        Expr::Column(Column {
            table: String::new(),
            name: self.to_string(),
        })
    }
}

impl IntoColumn for String {
    fn into_column(self) -> Expr {
        Expr::Column(Column {
            table: String::new(),
            name: self,
        })
    }
}

impl IntoColumn for &String {
    fn into_column(self) -> Expr {
        self.as_str().into_column()
    }
}

impl IntoColumn for Column {
    fn into_column(self) -> Expr {
        Expr::Column(self)
    }
}

impl IntoColumn for Expr {
    fn into_column(self) -> Expr {
        self
    }
}

/// 右操作数（值位置）的转换：IR 节点原样传递，普通值成为绑定参数。
pub trait IntoValue {
    fn into_value(self) -> Expr;
}

impl<T: Into<SqlValue>> IntoValue for T {
    fn into_value(self) -> Expr {
        Expr::Arg(Arg::Value(self.into()))
    }
}

impl IntoValue for Expr {
    fn into_value(self) -> Expr {
        self
    }
}

impl IntoValue for FindActions {
    fn into_value(self) -> Expr {
        Expr::Select(Box::new(self))
    }
}

impl IntoValue for Arg {
    fn into_value(self) -> Expr {
        Expr::Arg(self)
    }
}

impl IntoValue for Box<dyn SqlValuer> {
    fn into_value(self) -> Expr {
        Expr::Arg(Arg::Valuer(self))
    }
}

/// IN 列表的转换：集合展开为 [`Values`]，标量包成单元素列表，表达式与子查询原样传递。
pub trait IntoValues {
    fn into_values(self) -> Expr;
}

impl<T: IntoValue> IntoValues for Vec<T> {
    fn into_values(self) -> Expr {
        Expr::Values(Values {
            values: self.into_iter().map(IntoValue::into_value).collect(),
        })
    }
}

impl<T: IntoValue, const N: usize> IntoValues for [T; N] {
    fn into_values(self) -> Expr {
        Expr::Values(Values {
            values: self.into_iter().map(IntoValue::into_value).collect(),
        })
    }
}

impl<T: IntoValue + Clone> IntoValues for &[T] {
    fn into_values(self) -> Expr {
        Expr::Values(Values {
            values: self.iter().cloned().map(IntoValue::into_value).collect(),
        })
    }
}

impl IntoValues for Expr {
    fn into_values(self) -> Expr {
        self
    }
}

impl IntoValues for FindActions {
    fn into_values(self) -> Expr {
        Expr::Select(Box::new(self))
    }
}

macro_rules! scalar_into_values {
    ($($t:ty),+ $(,)?) => {
        $(impl IntoValues for $t {
            fn into_values(self) -> Expr {
                Expr::Values(Values {
                    values: vec![self.into_value()],
                })
            }
        })+
    };
}

scalar_into_values!(
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    &'static str,
    SqlValue
);

/// 条件位置的转换：`None` 与零值节点会被过滤掉。
pub trait IntoCondition {
    fn into_condition(self) -> Option<Expr>;
}

impl IntoCondition for Expr {
    fn into_condition(self) -> Option<Expr> {
        if self.is_zero() { None } else { Some(self) }
    }
}

impl IntoCondition for Option<Expr> {
    fn into_condition(self) -> Option<Expr> {
        self.and_then(IntoCondition::into_condition)
    }
}
