//! 方言的词法约定：标识符引用与占位符。

/// SQL 方言。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    MySQL,
}

impl Dialect {
    /// 标识符引用字符。
    pub fn quote_char(self) -> char {
        match self {
            Self::MySQL => '`',
        }
    }

    /// 引用一个标识符；标识符内部的引用字符会被转义（双写）。
    pub fn quote(self, name: &str) -> String {
        let q = self.quote_char();
        let mut out = String::with_capacity(name.len() + 2);
        out.push(q);
        for c in name.chars() {
            if c == q {
                out.push(q);
            }
            out.push(c);
        }
        out.push(q);
        out
    }

    /// 引用 `db`.`table`；`db` 为空时只引用表名。
    pub fn quote_table(self, database: &str, table: &str) -> String {
        if database.is_empty() {
            return self.quote(table);
        }
        format!("{}.{}", self.quote(database), self.quote(table))
    }

    /// 位置参数占位符。
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::MySQL => "?",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Dialect;

    #[test]
    fn placeholder_is_question_mark() {
        assert_eq!(Dialect::MySQL.placeholder(), "?");
    }

    #[test]
    fn quote_escapes_backticks() {
        assert_eq!(Dialect::MySQL.quote("name"), "`name`");
        assert_eq!(Dialect::MySQL.quote("we`ird"), "`we``ird`");
    }

    #[test]
    fn quote_table_with_database() {
        assert_eq!(Dialect::MySQL.quote_table("", "users"), "`users`");
        assert_eq!(Dialect::MySQL.quote_table("app", "users"), "`app`.`users`");
    }
}
