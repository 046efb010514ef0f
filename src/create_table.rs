//! CreateTableBuilder：拼装 CREATE TABLE 文本。
//!
//! 列与约束定义由调用方（schema 方言）生成，这里只负责语句结构。

use crate::string_builder::StringBuilder;

#[derive(Debug, Clone)]
pub struct CreateTableBuilder {
    verb: &'static str,
    if_not_exists: bool,
    table: String,
    defs: Vec<String>,
    options: Vec<String>,
}

impl CreateTableBuilder {
    /// `table` 应为已引用的表名。
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            verb: "CREATE TABLE",
            if_not_exists: false,
            table: table.into(),
            defs: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn temporary(&mut self) -> &mut Self {
        self.verb = "CREATE TEMPORARY TABLE";
        self
    }

    pub fn if_not_exists(&mut self) -> &mut Self {
        self.if_not_exists = true;
        self
    }

    /// 追加一个列或约束定义。
    pub fn define(&mut self, def: impl Into<String>) -> &mut Self {
        self.defs.push(def.into());
        self
    }

    /// 追加一个表选项，如 `ENGINE=INNODB`。
    pub fn option(&mut self, opt: impl Into<String>) -> &mut Self {
        self.options.push(opt.into());
        self
    }

    pub fn num_define(&self) -> usize {
        self.defs.len()
    }

    pub fn build(&self) -> String {
        let mut buf = StringBuilder::new();
        buf.write_leading(self.verb);
        if self.if_not_exists {
            buf.write_leading("IF NOT EXISTS");
        }
        buf.write_leading(&self.table);

        if !self.defs.is_empty() {
            buf.write_leading("(");
            buf.write_strings(&self.defs, ", ");
            buf.write_str(")");
        }

        if !self.options.is_empty() {
            buf.write_leading("");
            buf.write_strings(&self.options, " ");
        }
        buf.into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::CreateTableBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn create_table_with_defs_and_options() {
        let mut ctb = CreateTableBuilder::new("`demo`.`user`");
        ctb.if_not_exists()
            .define("`id` BIGINT NOT NULL AUTO_INCREMENT")
            .define("PRIMARY KEY (`id`)")
            .option("ENGINE=INNODB")
            .option("DEFAULT CHARSET=utf8mb4");
        assert_eq!(
            ctb.build(),
            "CREATE TABLE IF NOT EXISTS `demo`.`user` (`id` BIGINT NOT NULL AUTO_INCREMENT, PRIMARY KEY (`id`)) ENGINE=INNODB DEFAULT CHARSET=utf8mb4"
        );
    }

    #[test]
    fn temporary_table_and_clone() {
        let mut ctb = CreateTableBuilder::new("`t`");
        ctb.temporary().define("`a` INT");
        let mut clone = ctb.clone();
        clone.define("`b` INT");
        assert_eq!(ctb.num_define(), 1);
        assert_eq!(clone.num_define(), 2);
        assert_eq!(ctb.build(), "CREATE TEMPORARY TABLE `t` (`a` INT)");
    }
}
