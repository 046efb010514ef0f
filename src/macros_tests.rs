#[cfg(test)]
mod tests {
    use crate::{
        Expr, MySqlBuilder, SqlValue, column, count, desc, equal, find, greater_than, raw,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn and_macro_mixes_options_and_exprs() {
        let maybe: Option<Expr> = None;
        let got = crate::and!(equal("a", 1), maybe, raw(""), Some(equal("b", 2)));
        assert_eq!(got, crate::expr::and([equal("a", 1), equal("b", 2)]));
        assert_eq!(crate::and!(), Expr::default());
    }

    #[test]
    fn or_macro_nests_inside_and() {
        let b = MySqlBuilder::new();
        let cond = crate::and!(
            equal("x", 1),
            crate::or!(greater_than("y", 2), None::<Expr>, equal("z", 3)),
        );
        let (sql, args) = b.build_expr_sql(&cond).unwrap();
        assert_eq!(sql, "(`x` = ? AND (`y` > ? OR `z` = ?))");
        assert_eq!(
            args,
            vec![SqlValue::I64(1), SqlValue::I64(2), SqlValue::I64(3)]
        );
    }

    #[test]
    fn statement_macros() {
        let mut act = find();
        act.from("t");
        crate::select_cols!(act, "id", count("*"));
        crate::where_exprs!(act, equal("a", 1), None::<Expr>);
        crate::order_by!(act, "id", desc(column("name")));
        let (sql, _) = MySqlBuilder::new().build(&act).unwrap();
        assert_eq!(
            sql,
            "SELECT `id`,COUNT(*) FROM `t` WHERE `a` = ? ORDER BY `id`,`name` DESC"
        );
    }
}
