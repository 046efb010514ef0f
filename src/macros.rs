//! 宏集合：允许在可变参数位置混用不同类型的实参。
//!
//! 函数版本（[`and`](crate::expr::and)、[`FindActions::select`](crate::actions::FindActions::select) 等）
//! 要求实参同类型；宏在展开时逐个转换，于是 `"id"` 与 `count("*")` 可以写在同一个列表里。

/// `and!(a, b, ...)`：逐个经过 `IntoCondition` 后用 AND 连接。
#[macro_export]
macro_rules! and {
    ($($cond:expr),* $(,)?) => {{
        let conds: ::std::vec::Vec<::std::option::Option<$crate::primitive::Expr>> =
            ::std::vec![$($crate::primitive::IntoCondition::into_condition($cond)),*];
        $crate::expr::and(conds)
    }};
}

/// `or!(a, b, ...)`：同 [`and!`]，以 OR 连接。
#[macro_export]
macro_rules! or {
    ($($cond:expr),* $(,)?) => {{
        let conds: ::std::vec::Vec<::std::option::Option<$crate::primitive::Expr>> =
            ::std::vec![$($crate::primitive::IntoCondition::into_condition($cond)),*];
        $crate::expr::or(conds)
    }};
}

/// `where_exprs!(act, a, b, ...)`：设置 WHERE 条件。
#[macro_export]
macro_rules! where_exprs {
    ($act:expr $(, $cond:expr)* $(,)?) => {{
        let conds: ::std::vec::Vec<::std::option::Option<$crate::primitive::Expr>> =
            ::std::vec![$($crate::primitive::IntoCondition::into_condition($cond)),*];
        $act.where_(conds)
    }};
}

/// `select_cols!(act, "id", count("*"), ...)`：设置投影列。
#[macro_export]
macro_rules! select_cols {
    ($act:expr $(, $col:expr)* $(,)?) => {{
        let cols: ::std::vec::Vec<$crate::primitive::Expr> =
            ::std::vec![$($crate::primitive::IntoColumn::into_column($col)),*];
        $act.select(cols)
    }};
}

/// `order_by!(act, "a", desc("b"), ...)`：设置排序项。
#[macro_export]
macro_rules! order_by {
    ($act:expr $(, $col:expr)* $(,)?) => {{
        let cols: ::std::vec::Vec<$crate::primitive::Expr> =
            ::std::vec![$($crate::primitive::IntoColumn::into_column($col)),*];
        $act.order_by(cols)
    }};
}
