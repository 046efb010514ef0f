#[cfg(test)]
mod tests {
    use crate::builder::{BuildError, Statement, StatementBuilder};
    use crate::primitive::DataType;
    use crate::{
        Dialect, Expr, ExprKind, MySqlBuilder, SqlValue, SqlValuer, ValueKind, ValuerError,
        as_, between, cast_as, column, column_value, count, decrement, delete, delete_one, desc,
        equal, exists, field, find, find_one, for_update, greater_than, in_, increment, insert,
        is_null, json_contains, json_extract, like, lock_in_share_mode, member_of, not_exists,
        not_in, or, paginate, raw, table_column, update, update_one,
    };
    use pretty_assertions::assert_eq;

    fn mysql() -> MySqlBuilder {
        MySqlBuilder::new()
    }

    fn s(v: &'static str) -> SqlValue {
        SqlValue::from(v)
    }

    #[test]
    fn nil_conditions_are_filtered() {
        let mut act = find();
        act.from("t")
            .where_([Some(equal("A", 1)), None, Some(equal("B", 2))]);
        let (sql, args) = mysql().build(&act).unwrap();
        assert_eq!(sql, "SELECT * FROM `t` WHERE (`A` = ? AND `B` = ?)");
        assert_eq!(args, vec![SqlValue::I64(1), SqlValue::I64(2)]);
    }

    #[test]
    fn where_with_limit() {
        let mut act = find();
        act.from("t").where_([equal("x", 5)]).limit(10);
        let (sql, args) = mysql().build(&act).unwrap();
        assert_eq!(sql, "SELECT * FROM `t` WHERE `x` = ? LIMIT 10");
        assert_eq!(args, vec![SqlValue::I64(5)]);
    }

    #[test]
    fn zero_limit_is_omitted() {
        let mut act = find();
        act.from("t").limit(0);
        let (sql, args) = mysql().build(&act).unwrap();
        assert_eq!(sql, "SELECT * FROM `t`");
        assert!(args.is_empty());
    }

    #[test]
    fn offset_without_limit_uses_max_limit() {
        let mut act = find();
        act.from("t").offset(20);
        let (sql, _) = mysql().build(&act).unwrap();
        assert_eq!(sql, "SELECT * FROM `t` LIMIT 18446744073709551615 OFFSET 20");

        act.limit(10);
        let (sql, _) = mysql().build(&act).unwrap();
        assert_eq!(sql, "SELECT * FROM `t` LIMIT 10 OFFSET 20");
    }

    #[test]
    fn in_list_expands_placeholders() {
        let mut act = find();
        act.from("t").where_([in_("x", vec![1, 2, 3])]);
        let (sql, args) = mysql().build(&act).unwrap();
        assert_eq!(sql, "SELECT * FROM `t` WHERE `x` IN (?,?,?)");
        assert_eq!(
            args,
            vec![SqlValue::I64(1), SqlValue::I64(2), SqlValue::I64(3)]
        );
    }

    #[test]
    fn empty_in_list_renders_empty_parens() {
        let mut act = find();
        act.from("t").where_([not_in("x", Vec::<i64>::new())]);
        let (sql, args) = mysql().build(&act).unwrap();
        assert_eq!(sql, "SELECT * FROM `t` WHERE `x` NOT IN ()");
        assert!(args.is_empty());
    }

    #[test]
    fn projections_distinct_and_database() {
        let mut act = find();
        act.database("shop")
            .from("user")
            .distinct()
            .select(vec![column("id"), as_(count("*"), "c")]);
        let (sql, _) = mysql().build(&act).unwrap();
        assert_eq!(sql, "SELECT DISTINCT `id`,COUNT(*) AS `c` FROM `shop`.`user`");
    }

    #[test]
    fn order_by_mixes_columns_and_sorts() {
        let mut act = find();
        act.from("t")
            .order_by(vec![column("a"), desc("b"), field("c", [3, 1])]);
        let (sql, args) = mysql().build(&act).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM `t` ORDER BY `a`,`b` DESC,FIELD(`c`,?,?)"
        );
        assert_eq!(args, vec![SqlValue::I64(3), SqlValue::I64(1)]);
    }

    #[test]
    fn joins_group_by_having() {
        let mut act = find();
        act.from("users")
            .select(vec![table_column("users", "status"), count("*")])
            .inner_join(
                "orders",
                [equal(
                    table_column("users", "id"),
                    table_column("orders", "user_id"),
                )],
            )
            .group_by(vec![table_column("users", "status")])
            .having([greater_than(count("*"), 1)]);
        let (sql, args) = mysql().build(&act).unwrap();
        assert_eq!(
            sql,
            "SELECT `users`.`status`,COUNT(*) FROM `users` INNER JOIN `orders` ON `users`.`id` = `orders`.`user_id` GROUP BY `users`.`status` HAVING COUNT(*) > ?"
        );
        assert_eq!(args, vec![SqlValue::I64(1)]);
    }

    #[test]
    fn cross_join_without_on() {
        let mut act = find();
        act.from("a").cross_join("b");
        let (sql, _) = mysql().build(&act).unwrap();
        assert_eq!(sql, "SELECT * FROM `a` CROSS JOIN `b`");
    }

    #[test]
    fn locking_reads() {
        let mut act = find();
        act.from("t")
            .where_([equal("id", 1)])
            .lock(for_update().skip_locked());
        let (sql, _) = mysql().build(&act).unwrap();
        assert_eq!(sql, "SELECT * FROM `t` WHERE `id` = ? FOR UPDATE SKIP LOCKED");

        act.lock(lock_in_share_mode().no_wait());
        let (sql, _) = mysql().build(&act).unwrap();
        assert_eq!(sql, "SELECT * FROM `t` WHERE `id` = ? LOCK IN SHARE MODE");
    }

    #[test]
    fn subquery_in_value_position() {
        let mut sub = find();
        sub.from("orders")
            .select(["user_id"])
            .where_([greater_than("amount", 100)]);

        let mut act = find();
        act.from("users")
            .where_([equal("active", true), in_("id", sub)]);
        let (sql, args) = mysql().build(&act).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM `users` WHERE (`active` = ? AND `id` IN (SELECT `user_id` FROM `orders` WHERE `amount` > ?))"
        );
        assert_eq!(args, vec![SqlValue::I64(1), SqlValue::I64(100)]);
    }

    #[test]
    fn exists_and_not_exists() {
        let mut sub = find();
        sub.from("orders").where_([equal(
            table_column("orders", "user_id"),
            table_column("users", "id"),
        )]);

        let mut act = find();
        act.from("users").where_([or([
            exists(sub.clone()),
            not_exists(sub),
        ])]);
        let (sql, args) = mysql().build(&act).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM `users` WHERE (EXISTS (SELECT * FROM `orders` WHERE `orders`.`user_id` = `users`.`id`) OR NOT EXISTS (SELECT * FROM `orders` WHERE `orders`.`user_id` = `users`.`id`))"
        );
        assert!(args.is_empty());
    }

    #[test]
    fn predicates_render_in_mysql_syntax() {
        let b = mysql();
        let cases: Vec<(Expr, &str)> = vec![
            (between("age", 18, 30), "`age` BETWEEN ? AND ?"),
            (like("name", "jo%"), "`name` LIKE ?"),
            (is_null("deleted_at"), "`deleted_at` IS NULL"),
            (member_of("tags", "red"), "? MEMBER OF(`tags`)"),
            (json_extract("doc", ["$.a"]), "JSON_EXTRACT(`doc`,?)"),
            (
                json_contains("doc", "1", Some("$.a")),
                "JSON_CONTAINS(`doc`,?,?)",
            ),
            (cast_as("7", DataType::Signed), "CAST(? AS SIGNED)"),
            (raw("NOW()"), "NOW()"),
        ];
        for (expr, want) in cases {
            let (sql, _) = b.build_expr_sql(&expr).unwrap();
            assert_eq!(sql, want);
        }
    }

    #[test]
    fn update_with_assignments() {
        let mut act = update();
        act.table("users")
            .set([column_value("name", "x"), increment("visits", 1)])
            .set([decrement("credits", 2)])
            .where_([equal("id", 3)])
            .order_by(["id"])
            .limit(1);
        let (sql, args) = mysql().build(&act).unwrap();
        assert_eq!(
            sql,
            "UPDATE `users` SET `name` = ?,`visits` = `visits` + ?,`credits` = `credits` - ? WHERE `id` = ? ORDER BY `id` LIMIT 1"
        );
        assert_eq!(
            args,
            vec![
                s("x"),
                SqlValue::I64(1),
                SqlValue::I64(2),
                SqlValue::I64(3)
            ]
        );
    }

    #[test]
    fn update_without_values_fails() {
        let mut act = update();
        act.table("users").where_([equal("id", 3)]);
        assert_eq!(
            mysql().build(&act).unwrap_err(),
            BuildError::EmptyValues("update")
        );
    }

    #[test]
    fn update_one_and_delete_one_limit_to_one() {
        let mut up = update_one();
        up.table("t")
            .set([column_value("a", 1)])
            .where_([equal("id", 9)]);
        let (sql, _) = mysql().build(&up).unwrap();
        assert_eq!(sql, "UPDATE `t` SET `a` = ? WHERE `id` = ? LIMIT 1");

        let mut del = delete_one();
        del.from("t").where_([equal("id", 9)]);
        let (sql, _) = mysql().build(&del).unwrap();
        assert_eq!(sql, "DELETE FROM `t` WHERE `id` = ? LIMIT 1");
    }

    #[test]
    fn delete_with_order_and_limit() {
        let mut act = delete();
        act.database("db")
            .from("t")
            .where_([is_null("deleted_at")])
            .order_by(["id"])
            .limit(5);
        let (sql, args) = mysql().build(&act).unwrap();
        assert_eq!(
            sql,
            "DELETE FROM `db`.`t` WHERE `deleted_at` IS NULL ORDER BY `id` LIMIT 5"
        );
        assert!(args.is_empty());
    }

    #[test]
    fn insert_rows_and_upsert() {
        let mut act = insert();
        act.into_table("t")
            .columns(["a", "b"])
            .values([1, 2])
            .values([3, 4]);
        let (sql, args) = mysql().build(&act).unwrap();
        assert_eq!(sql, "INSERT INTO `t` (`a`,`b`) VALUES (?,?),(?,?)");
        assert_eq!(args.len(), 4);

        act.ignore().on_duplicate_key_update(Vec::<String>::new());
        let (sql, _) = mysql().build(&act).unwrap();
        assert_eq!(
            sql,
            "INSERT IGNORE INTO `t` (`a`,`b`) VALUES (?,?),(?,?) ON DUPLICATE KEY UPDATE `a` = VALUES(`a`),`b` = VALUES(`b`)"
        );

        act.on_duplicate_key_update(["b"]);
        let (sql, _) = mysql().build(&act).unwrap();
        assert!(sql.ends_with("ON DUPLICATE KEY UPDATE `b` = VALUES(`b`)"));
    }

    #[test]
    fn insert_without_rows_fails() {
        let mut act = insert();
        act.into_table("t").columns(["a"]);
        assert_eq!(
            mysql().build(&act).unwrap_err(),
            BuildError::EmptyValues("insert")
        );
    }

    #[test]
    fn find_one_forces_single_row() {
        let mut act = find_one();
        act.from("t").where_([equal("id", 1)]);
        let (sql, args) = mysql().build(&act).unwrap();
        assert_eq!(sql, "SELECT * FROM `t` WHERE `id` = ? LIMIT 1");
        assert_eq!(args, vec![SqlValue::I64(1)]);
    }

    #[test]
    fn paginate_builds_keyset_condition() {
        let mut act = paginate();
        act.from("t")
            .where_([equal("status", 1)])
            .order_by(vec![column("created_at"), desc("id")])
            .after([SqlValue::from(100), SqlValue::from(7)])
            .limit(20);
        let (sql, args) = mysql().build(&act).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM `t` WHERE (`status` = ? AND (`created_at` > ? OR (`created_at` = ? AND `id` < ?))) ORDER BY `created_at`,`id` DESC LIMIT 20"
        );
        assert_eq!(
            args,
            vec![
                SqlValue::I64(1),
                SqlValue::I64(100),
                SqlValue::I64(100),
                SqlValue::I64(7)
            ]
        );
    }

    #[test]
    fn paginate_first_page_has_no_cursor() {
        let mut act = paginate();
        act.from("t").order_by(["id"]).limit(20);
        let (sql, _) = mysql().build(&act).unwrap();
        assert_eq!(sql, "SELECT * FROM `t` ORDER BY `id` LIMIT 20");
    }

    #[test]
    fn empty_table_is_an_error() {
        let act = find();
        assert_eq!(
            mysql().build(&act).unwrap_err(),
            BuildError::EmptyTable("find")
        );
    }

    #[test]
    fn encoders_normalize_values() {
        let b = mysql();
        assert_eq!(b.encode(SqlValue::Bool(true)).unwrap(), SqlValue::I64(1));
        assert_eq!(
            b.encode(SqlValue::from(time::macros::datetime!(
                2024-01-02 03:04:05.123456 +08:00
            )))
            .unwrap(),
            s("2024-01-01 19:04:05.123456")
        );
        assert_eq!(
            b.encode(SqlValue::from(time::macros::date!(2024-02-29)))
                .unwrap(),
            s("2024-02-29")
        );
        assert_eq!(
            b.encode(SqlValue::from(serde_json::json!({"a": 1})))
                .unwrap(),
            s("{\"a\":1}")
        );
        assert_eq!(b.encode(SqlValue::Null).unwrap(), SqlValue::Null);
    }

    #[test]
    fn unregistered_kinds_fail() {
        let sb = StatementBuilder::new(Dialect::MySQL);
        let mut stmt = sb.statement("find");
        assert_eq!(
            sb.build_expr(&mut stmt, &raw("x")).unwrap_err(),
            BuildError::UnregisteredExpr {
                kind: ExprKind::Raw,
                op: "find"
            }
        );
        assert_eq!(
            sb.build_expr(&mut stmt, &crate::IntoValue::into_value(5_i64))
                .unwrap_err(),
            BuildError::NoEncoder(ValueKind::I64)
        );
    }

    fn shout_raw(
        _: &StatementBuilder,
        stmt: &mut Statement,
        expr: &Expr,
    ) -> Result<(), BuildError> {
        if let Expr::Raw(r) = expr {
            stmt.write_str(&r.value.to_uppercase());
        }
        Ok(())
    }

    #[test]
    fn renderers_can_be_replaced() {
        let mut b = mysql();
        b.set_renderer(ExprKind::Raw, shout_raw);
        let (sql, _) = b.build_expr_sql(&raw("now()")).unwrap();
        assert_eq!(sql, "NOW()");
        assert!(b.has_renderer(ExprKind::Raw));
    }

    #[derive(Debug, Clone)]
    struct Fixed(i64);

    impl SqlValuer for Fixed {
        fn value(&self) -> Result<SqlValue, ValuerError> {
            Ok(SqlValue::I64(self.0))
        }
    }

    #[derive(Debug, Clone)]
    struct Broken;

    impl SqlValuer for Broken {
        fn value(&self) -> Result<SqlValue, ValuerError> {
            Err(ValuerError("boom".to_string()))
        }
    }

    #[test]
    fn valuers_are_resolved_at_build_time() {
        let mut act = find();
        act.from("t")
            .where_([equal("x", Box::new(Fixed(42)) as Box<dyn SqlValuer>)]);
        let (sql, args) = mysql().build(&act).unwrap();
        assert_eq!(sql, "SELECT * FROM `t` WHERE `x` = ?");
        assert_eq!(args, vec![SqlValue::I64(42)]);

        act.where_([equal("x", Box::new(Broken) as Box<dyn SqlValuer>)]);
        assert_eq!(
            mysql().build(&act).unwrap_err(),
            BuildError::Valuer(ValuerError("boom".to_string()))
        );
    }
}
