//! Field mapper：tag 没有给出列名时，把 Rust 字段名转换为列名。
//!
//! mapper 由 [`Mapper`](crate::mapper::Mapper) 持有，不存在全局默认值。

use std::sync::Arc;

/// 字段名映射函数类型。
pub type FieldMapperFunc = Arc<dyn Fn(&str) -> String + Send + Sync + 'static>;

/// 恒等 mapper：字段名原样作为列名。
pub fn identity_mapper() -> FieldMapperFunc {
    Arc::new(|s: &str| s.to_string())
}

fn convert_with_separator(s: &str, sep: char) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    let mut prev: Option<char> = None;
    let chars: Vec<char> = s.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();
        let is_upper = c.is_ascii_uppercase();

        if is_upper {
            if let Some(p) = prev {
                let prev_is_lower_or_digit = p.is_ascii_lowercase() || p.is_ascii_digit();
                let prev_is_upper = p.is_ascii_uppercase();
                let next_is_lower = next.map(|n| n.is_ascii_lowercase()).unwrap_or(false);

                if prev_is_lower_or_digit || (prev_is_upper && next_is_lower) {
                    out.push(sep);
                }
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }

        prev = Some(c);
    }

    out
}

/// 将 `CamelCase` 转为 `snake_case`；已经是 snake_case 的名字保持不变。
///
/// 单词边界（`aB`/`a1B`/`ABc`）插入 `_`，大写转小写。
pub fn snake_case_mapper(s: &str) -> String {
    convert_with_separator(s, '_')
}

/// 将 `CamelCase` 转为 `kebab-case`。
pub fn kebab_case_mapper(s: &str) -> String {
    convert_with_separator(s, '-')
}

/// 将字段名转为全大写。
pub fn upper_case_mapper(s: &str) -> String {
    s.to_ascii_uppercase()
}

/// 在字段名前添加固定前缀。
pub fn prefix_mapper(prefix: &'static str) -> FieldMapperFunc {
    Arc::new(move |name| format!("{prefix}{name}"))
}

/// 在字段名后添加固定后缀。
pub fn suffix_mapper(suffix: &'static str) -> FieldMapperFunc {
    Arc::new(move |name| format!("{name}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_helpers_work() {
        assert_eq!(snake_case_mapper("FieldName"), "field_name");
        assert_eq!(snake_case_mapper("HTTPServer"), "http_server");
        assert_eq!(snake_case_mapper("created_at"), "created_at");
        assert_eq!(kebab_case_mapper("FieldName"), "field-name");
    }

    #[test]
    fn identity_mapper_keeps_name() {
        assert_eq!(identity_mapper()("CreatedAt"), "CreatedAt");
    }

    #[test]
    fn upper_case_mapper_changes_case() {
        assert_eq!(upper_case_mapper("FieldName"), "FIELDNAME");
    }

    #[test]
    fn prefix_suffix_mappers_apply() {
        let prefix = prefix_mapper("db_");
        let suffix = suffix_mapper("_col");
        assert_eq!(prefix("FieldName"), "db_FieldName");
        assert_eq!(suffix("FieldName"), "FieldName_col");
    }
}
