#[cfg(test)]
mod tests {
    use crate::mapper::Mapper;
    use crate::primitive::{Expr, IntoValue};
    use crate::{
        MySqlBuilder, MySqlSchema, SqlValue, asc, column, column_value, delete_one, desc, equal, field, find,
        find_one, insert, paginate, update, update_one,
    };
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Row {
        id: i64,
        name: String,
        full: String,
        secret: String,
    }

    crate::sql_struct! {
        impl Row {
            id:     { tag: "id" },
            name:   { tag: "" },
            full:   { tag: "full,virtual_column" },
            secret: { tag: "secret" },
        }
    }

    #[test]
    fn where_replaces_previous_conditions() {
        let mut act = find();
        act.where_([equal("a", 1)]);
        act.where_([equal("b", 2)]);
        assert_eq!(act.conditions, equal("b", 2));
    }

    #[test]
    fn order_by_wraps_plain_columns() {
        let mut act = find();
        act.order_by(vec![column("a"), desc("b"), field("c", [1])]);
        assert_eq!(
            act.sorts,
            vec![asc("a"), desc("b"), field("c", [1])]
        );
    }

    #[test]
    fn actions_are_independent_after_clone() {
        let mut base = find();
        base.from("t").where_([equal("a", 1)]);
        let mut copy = base.clone();
        copy.limit(5).where_([equal("b", 2)]);
        assert_eq!(base.count, 0);
        assert_eq!(base.conditions, equal("a", 1));
        assert_eq!(copy.count, 5);
    }

    #[test]
    fn single_row_views_fix_the_limit() {
        let mut one = find_one();
        one.from("t").where_([equal("id", 1)]);
        let act = one.to_find();
        assert_eq!(act.count, 1);
        assert_eq!(act.skip, 0);
        assert_eq!(act.table, "t");

        let mut up = update_one();
        up.table("t").set([column_value("a", 1)]);
        assert_eq!(up.to_update().count, 1);

        let mut del = delete_one();
        del.from("t");
        assert_eq!(del.to_delete().count, 1);
    }

    #[test]
    fn update_set_accumulates() {
        let mut act = update();
        act.set([column_value("a", 1)]).set([column_value("b", 2)]);
        assert_eq!(act.values.len(), 2);
    }

    #[test]
    fn paginate_without_cursor_keeps_conditions() {
        let mut act = paginate();
        act.from("t").where_([equal("a", 1)]).order_by(["id"]);
        assert_eq!(act.to_find().conditions, equal("a", 1));
    }

    #[test]
    fn records_skip_omitted_columns() {
        let m = Mapper::new();
        let codec = m.codec_by_type::<Row>();
        let rows = [
            Row {
                id: 1,
                name: "a".to_string(),
                full: "A".to_string(),
                ..Default::default()
            },
            Row {
                id: 2,
                name: "b".to_string(),
                full: "B".to_string(),
                ..Default::default()
            },
        ];

        let mut act = insert();
        act.into_table("t").omit_fields(["secret"]).records(&codec, &rows);
        assert_eq!(
            act.columns,
            vec!["id".to_string(), "name".to_string(), "full".to_string()]
        );
        assert_eq!(
            act.rows,
            vec![
                vec![
                    SqlValue::I64(1).into_value(),
                    SqlValue::from("a").into_value(),
                    SqlValue::from("A").into_value(),
                ],
                vec![
                    SqlValue::I64(2).into_value(),
                    SqlValue::from("b").into_value(),
                    SqlValue::from("B").into_value(),
                ],
            ]
        );

        let (sql, args) = MySqlBuilder::new().build(&act).unwrap();
        assert_eq!(sql, "INSERT INTO `t` (`id`,`name`,`full`) VALUES (?,?,?),(?,?,?)");
        assert_eq!(args.len(), 6);
    }

    #[test]
    fn top_level_generated_tag_is_a_plain_column() {
        // 没有 JSON 父列时，DDL 与 INSERT 都把它当普通列
        let m = Mapper::new();
        let codec = m.codec_by_type::<Row>();
        let sql = MySqlSchema::new().create_table("", "t", None, &codec).unwrap();
        assert!(sql.contains(
            "`full` VARCHAR(191) CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci NOT NULL DEFAULT ''"
        ));
        assert!(!sql.contains(" AS ("));

        let mut act = insert();
        act.into_table("t").records(&codec, &[Row::default()]);
        assert!(act.columns.iter().any(|c| c == "full"));
    }

    #[test]
    fn default_expr_is_zero() {
        assert!(Expr::default().is_zero());
        assert!(find().conditions.is_zero());
    }
}
