//! MySQL schema 方言：列类型规则与 DDL 语句。

use crate::create_table::CreateTableBuilder;
use crate::dialect::Dialect;
use crate::indexes::{Direction, Index, IndexKind};
use crate::mapper::{Struct, StructField};
use crate::reflect::{
    DATE_TYPE_NAME, DATETIME_TYPE_NAME, JSON_TYPE_NAME, Kind, PRIMITIVE_DATETIME_TYPE_NAME,
};
use crate::schema::{
    Builder, Column, DataType, SPATIAL_LINE_STRING, SPATIAL_MULTI_LINE_STRING,
    SPATIAL_MULTI_POINT, SPATIAL_MULTI_POLYGON, SPATIAL_POINT, SPATIAL_POLYGON, SchemaConfig,
    SchemaError,
};
use crate::value::SqlValue;

const ENUM_CHARSET: &str = "latin1";
const ENUM_COLLATION: &str = "latin1_swedish_ci";
const MAX_TIME_PRECISION: usize = 6;

fn base_column(sf: &StructField) -> Column {
    Column {
        name: sf.name().to_string(),
        nullable: sf.is_nullable(),
        ..Default::default()
    }
}

/// 数值 tag；缺失或非法时使用 `default`。
fn tag_usize(sf: &StructField, key: &str, default: usize) -> usize {
    match sf.tag().look_up(key) {
        None => default,
        Some(v) => v.parse().unwrap_or_else(|_| {
            log::warn!(
                "schema field {}: invalid {key} tag {v:?}, using {default}",
                sf.path()
            );
            default
        }),
    }
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn string_column(cfg: &SchemaConfig, sf: &StructField) -> Result<Column, SchemaError> {
    let tag = sf.tag();
    let mut col = base_column(sf);
    let explicit_charset = tag.look_up("charset").filter(|v| !v.is_empty());
    let explicit_collation = tag.look_up("collate").filter(|v| !v.is_empty());
    col.charset = Some(explicit_charset.unwrap_or(&cfg.charset).to_string());
    col.collation = Some(explicit_collation.unwrap_or(&cfg.collation).to_string());

    if let Some(raw) = tag.look_up("enum") {
        let values: Vec<&str> = raw
            .split('|')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect();
        let Some(first) = values.first() else {
            return Err(SchemaError::InvalidTag {
                field: sf.path().to_string(),
                tag: "enum",
                value: raw.to_string(),
            });
        };
        col.data_type = "ENUM".to_string();
        col.sql_type = format!(
            "ENUM({})",
            values
                .iter()
                .map(|v| quote_literal(v))
                .collect::<Vec<_>>()
                .join(",")
        );
        col.default_value = Some((*first).to_string());
        if explicit_charset.is_none() {
            col.charset = Some(ENUM_CHARSET.to_string());
            if explicit_collation.is_none() {
                col.collation = Some(ENUM_COLLATION.to_string());
            }
        }
        return Ok(col);
    }

    if let Some(raw) = tag.look_up("char") {
        let size: usize = raw.parse().map_err(|_| SchemaError::InvalidTag {
            field: sf.path().to_string(),
            tag: "char",
            value: raw.to_string(),
        })?;
        col.data_type = "CHAR".to_string();
        col.sql_type = format!("CHAR({size})");
        col.size = size;
        if !col.nullable {
            col.default_value = Some(String::new());
        }
        return Ok(col);
    }

    if tag.has("longtext") {
        col.data_type = "TEXT".to_string();
        col.sql_type = "TEXT".to_string();
        col.charset = None;
        col.collation = None;
        return Ok(col);
    }

    let size = tag_usize(sf, "size", cfg.string_size);
    col.data_type = "VARCHAR".to_string();
    col.sql_type = format!("VARCHAR({size})");
    col.size = size;
    if !col.nullable {
        col.default_value = Some(String::new());
    }
    Ok(col)
}

fn bool_column(_: &SchemaConfig, sf: &StructField) -> Result<Column, SchemaError> {
    let mut col = base_column(sf);
    col.data_type = "TINYINT".to_string();
    col.sql_type = "TINYINT(1)".to_string();
    col.size = 1;
    if !col.nullable {
        col.default_value = Some("0".to_string());
    }
    Ok(col)
}

fn integer_column(sf: &StructField, unsigned: bool) -> Column {
    let mut col = base_column(sf);
    let data_type = match sf.ty().deref().kind() {
        Kind::Int8 | Kind::Uint8 => "TINYINT",
        Kind::Int16 | Kind::Uint16 => "SMALLINT",
        Kind::Int32 | Kind::Uint32 => "INT",
        _ => "BIGINT",
    };
    col.data_type = data_type.to_string();
    col.sql_type = if unsigned {
        format!("{data_type} UNSIGNED")
    } else {
        data_type.to_string()
    };
    if sf.tag().has("auto_increment") {
        col.extra = "AUTO_INCREMENT".to_string();
    } else if !col.nullable {
        col.default_value = Some("0".to_string());
    }
    col
}

fn int_column(_: &SchemaConfig, sf: &StructField) -> Result<Column, SchemaError> {
    Ok(integer_column(sf, sf.tag().has("unsigned")))
}

fn uint_column(_: &SchemaConfig, sf: &StructField) -> Result<Column, SchemaError> {
    Ok(integer_column(sf, true))
}

fn float_column(_: &SchemaConfig, sf: &StructField) -> Result<Column, SchemaError> {
    let mut col = base_column(sf);
    col.data_type = "REAL".to_string();
    col.sql_type = if sf.tag().has("unsigned") {
        "REAL UNSIGNED".to_string()
    } else {
        "REAL".to_string()
    };
    if !col.nullable {
        col.default_value = Some("0".to_string());
    }
    Ok(col)
}

fn datetime_column(cfg: &SchemaConfig, sf: &StructField) -> Result<Column, SchemaError> {
    let mut col = base_column(sf);
    let mut size = tag_usize(sf, "size", cfg.time_precision);
    if size > MAX_TIME_PRECISION {
        log::warn!(
            "schema field {}: datetime precision {size} exceeds {MAX_TIME_PRECISION}",
            sf.path()
        );
        size = MAX_TIME_PRECISION;
    }
    col.data_type = "DATETIME".to_string();
    col.size = size;
    let (sql_type, now) = if size > 0 {
        (
            format!("DATETIME({size})"),
            format!("CURRENT_TIMESTAMP({size})"),
        )
    } else {
        ("DATETIME".to_string(), "CURRENT_TIMESTAMP".to_string())
    };
    col.sql_type = sql_type;
    if !col.nullable {
        col.default_value = Some(now);
    }
    Ok(col)
}

fn date_column(_: &SchemaConfig, sf: &StructField) -> Result<Column, SchemaError> {
    let mut col = base_column(sf);
    col.data_type = "DATE".to_string();
    col.sql_type = "DATE".to_string();
    if !col.nullable {
        col.default_value = Some("(CURRENT_DATE)".to_string());
    }
    Ok(col)
}

fn bytes_column(_: &SchemaConfig, sf: &StructField) -> Result<Column, SchemaError> {
    let mut col = base_column(sf);
    col.data_type = "MEDIUMBLOB".to_string();
    col.sql_type = "MEDIUMBLOB".to_string();
    Ok(col)
}

fn json_column(_: &SchemaConfig, sf: &StructField) -> Result<Column, SchemaError> {
    let mut col = base_column(sf);
    col.data_type = "JSON".to_string();
    col.sql_type = "JSON".to_string();
    Ok(col)
}

fn spatial_column(sf: &StructField, data_type: &str) -> Column {
    let mut col = base_column(sf);
    col.data_type = data_type.to_string();
    col.sql_type = data_type.to_string();
    if let Some(raw) = sf.tag().look_up("srid") {
        match raw.parse::<u32>() {
            Ok(srid) => col.extra = format!("SRID {srid}"),
            Err(_) => log::warn!("schema field {}: invalid srid tag {raw:?}", sf.path()),
        }
    }
    col
}

macro_rules! spatial_columns {
    ($($f:ident => $name:literal),+ $(,)?) => {
        $(fn $f(_: &SchemaConfig, sf: &StructField) -> Result<Column, SchemaError> {
            Ok(spatial_column(sf, $name))
        })+
    };
}

spatial_columns!(
    point_column => "POINT",
    line_string_column => "LINESTRING",
    polygon_column => "POLYGON",
    multi_point_column => "MULTIPOINT",
    multi_line_string_column => "MULTILINESTRING",
    multi_polygon_column => "MULTIPOLYGON",
);

/// 列定义文本：`` `name` TYPE [CHARACTER SET cs] [COLLATE co] [NOT NULL] [DEFAULT v] [extra] ``。
pub fn column_definition(col: &Column) -> String {
    let mut out = Dialect::MySQL.quote(&col.name);
    out.push(' ');
    out.push_str(&col.sql_type);
    if let Some(cs) = &col.charset {
        out.push_str(" CHARACTER SET ");
        out.push_str(cs);
    }
    if let Some(co) = &col.collation {
        out.push_str(" COLLATE ");
        out.push_str(co);
    }
    if !col.nullable {
        out.push_str(" NOT NULL");
    }
    if let Some(v) = &col.default_value {
        out.push_str(" DEFAULT ");
        match col.data_type.as_str() {
            "VARCHAR" | "CHAR" | "ENUM" => out.push_str(&quote_literal(v)),
            _ => out.push_str(v),
        }
    }
    if !col.extra.is_empty() {
        out.push(' ');
        out.push_str(&col.extra);
    }
    out
}

/// MySQL 的 schema 生成器。
#[derive(Debug, Clone)]
pub struct MySqlSchema {
    builder: Builder,
}

impl Default for MySqlSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl MySqlSchema {
    pub fn new() -> Self {
        Self::with_config(SchemaConfig::default())
    }

    pub fn with_config(config: SchemaConfig) -> Self {
        let mut b = Builder::new(config);
        b.set_type_name(DATETIME_TYPE_NAME, DataType::DateTime)
            .set_type_name(PRIMITIVE_DATETIME_TYPE_NAME, DataType::DateTime)
            .set_type_name(DATE_TYPE_NAME, DataType::Date)
            .set_type_name(JSON_TYPE_NAME, DataType::Json)
            .set_type_name(SPATIAL_POINT, DataType::Point)
            .set_type_name(SPATIAL_LINE_STRING, DataType::LineString)
            .set_type_name(SPATIAL_POLYGON, DataType::Polygon)
            .set_type_name(SPATIAL_MULTI_POINT, DataType::MultiPoint)
            .set_type_name(SPATIAL_MULTI_LINE_STRING, DataType::MultiLineString)
            .set_type_name(SPATIAL_MULTI_POLYGON, DataType::MultiPolygon);

        b.set_column(DataType::String, string_column)
            .set_column(DataType::Bool, bool_column)
            .set_column(DataType::Int, int_column)
            .set_column(DataType::Uint, uint_column)
            .set_column(DataType::Float, float_column)
            .set_column(DataType::DateTime, datetime_column)
            .set_column(DataType::Date, date_column)
            .set_column(DataType::Bytes, bytes_column)
            .set_column(DataType::Json, json_column)
            .set_column(DataType::Point, point_column)
            .set_column(DataType::LineString, line_string_column)
            .set_column(DataType::Polygon, polygon_column)
            .set_column(DataType::MultiPoint, multi_point_column)
            .set_column(DataType::MultiLineString, multi_line_string_column)
            .set_column(DataType::MultiPolygon, multi_polygon_column);
        Self { builder: b }
    }

    pub fn builder(&self) -> &Builder {
        &self.builder
    }

    pub fn get_column(&self, sf: &StructField) -> Result<Column, SchemaError> {
        self.builder.get_column(sf)
    }

    /// 表的全部列定义（普通列在前，生成列随后），按遍历顺序。
    fn column_definitions(&self, codec: &Struct) -> Result<Vec<(String, String)>, SchemaError> {
        let mut defs = Vec::new();
        for sf in codec.properties() {
            let col = self.get_column(sf)?;
            defs.push((col.name.clone(), column_definition(&col)));
        }
        defs.extend(self.generated_columns(codec)?);
        Ok(defs)
    }

    /// JSON 列内部带 `virtual_column`/`stored_column` tag 的字段生成的列。
    fn generated_columns(&self, codec: &Struct) -> Result<Vec<(String, String)>, SchemaError> {
        let mut out = Vec::new();
        for sf in codec.fields() {
            let (stored, name) = match (
                sf.tag().look_up("stored_column"),
                sf.tag().look_up("virtual_column"),
            ) {
                (Some(n), _) => (true, n),
                (None, Some(n)) => (false, n),
                (None, None) => continue,
            };
            let Some(parent) = codec.column_root(sf) else {
                continue;
            };
            let name = if name.is_empty() { sf.name() } else { name };
            let rel = sf
                .path()
                .strip_prefix(parent.path())
                .and_then(|p| p.strip_prefix('.'))
                .unwrap_or(sf.name());
            let col = self.get_column(sf)?;
            let def = format!(
                "{} {} AS ({}->>{}) {}",
                Dialect::MySQL.quote(name),
                col.sql_type,
                Dialect::MySQL.quote(parent.name()),
                quote_literal(&format!("$.{rel}")),
                if stored { "STORED" } else { "VIRTUAL" }
            );
            out.push((name.to_string(), def));
        }
        Ok(out)
    }

    fn primary_keys(pk: Option<&str>, codec: &Struct) -> Vec<String> {
        match pk {
            Some(pk) if !pk.is_empty() => vec![pk.to_string()],
            _ => codec
                .properties()
                .into_iter()
                .filter(|sf| sf.tag().has("primary_key"))
                .map(|sf| sf.name().to_string())
                .collect(),
        }
    }

    fn quote_list(names: &[String]) -> String {
        names
            .iter()
            .map(|n| Dialect::MySQL.quote(n))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// `CREATE TABLE`：列、生成列、主键、唯一索引与表选项。
    pub fn create_table(
        &self,
        database: &str,
        table: &str,
        pk: Option<&str>,
        codec: &Struct,
    ) -> Result<String, SchemaError> {
        let cfg = self.builder.config();
        let mut ctb = CreateTableBuilder::new(Dialect::MySQL.quote_table(database, table));
        for (_, def) in self.column_definitions(codec)? {
            ctb.define(def);
        }

        let pks = Self::primary_keys(pk, codec);
        if !pks.is_empty() {
            ctb.define(format!("PRIMARY KEY ({})", Self::quote_list(&pks)));
        }
        for sf in codec.properties() {
            let Some(name) = sf.tag().look_up("unique_index") else {
                continue;
            };
            let index_name = if name.is_empty() {
                format!("UX_{}", sf.name())
            } else {
                name.to_string()
            };
            ctb.define(format!(
                "UNIQUE INDEX {} ({})",
                Dialect::MySQL.quote(&index_name),
                Dialect::MySQL.quote(sf.name())
            ));
        }

        ctb.option(format!("ENGINE={}", cfg.engine))
            .option(format!("DEFAULT CHARSET={}", cfg.charset))
            .option(format!("COLLATE={}", cfg.collation));
        let sql = ctb.build();
        log::trace!("mysql create_table: {sql}");
        Ok(sql)
    }

    /// `ALTER TABLE`：已存在的列 MODIFY，新列 ADD 到前一列之后；缺少主键时补上。
    pub fn alter_table(
        &self,
        database: &str,
        table: &str,
        pk: Option<&str>,
        has_primary_key: bool,
        existing: &[String],
        codec: &Struct,
    ) -> Result<String, SchemaError> {
        let mut clauses = Vec::new();
        let mut prev: Option<String> = None;
        for (name, def) in self.column_definitions(codec)? {
            if existing.iter().any(|c| c.eq_ignore_ascii_case(&name)) {
                clauses.push(format!("MODIFY {def}"));
            } else {
                let position = match &prev {
                    Some(p) => format!("AFTER {}", Dialect::MySQL.quote(p)),
                    None => "FIRST".to_string(),
                };
                clauses.push(format!("ADD {def} {position}"));
            }
            prev = Some(name);
        }

        let pks = Self::primary_keys(pk, codec);
        if !has_primary_key && !pks.is_empty() {
            clauses.push(format!("ADD PRIMARY KEY ({})", Self::quote_list(&pks)));
        }

        let sql = format!(
            "ALTER TABLE {} {}",
            Dialect::MySQL.quote_table(database, table),
            clauses.join(", ")
        );
        log::trace!("mysql alter_table: {sql}");
        Ok(sql)
    }

    /// 每个索引一条语句；主键使用 `ALTER TABLE ... ADD PRIMARY KEY`。
    pub fn create_indexes(&self, database: &str, table: &str, indexes: &[Index]) -> Vec<String> {
        let table = Dialect::MySQL.quote_table(database, table);
        indexes
            .iter()
            .map(|idx| {
                let columns = idx
                    .columns
                    .iter()
                    .map(|c| match c.direction {
                        Direction::Ascending => Dialect::MySQL.quote(&c.name),
                        Direction::Descending => format!("{} DESC", Dialect::MySQL.quote(&c.name)),
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                if idx.kind == IndexKind::Primary {
                    return format!("ALTER TABLE {table} ADD PRIMARY KEY ({columns})");
                }
                let prefix = match idx.kind {
                    IndexKind::Unique => "CREATE UNIQUE INDEX",
                    IndexKind::FullText => "CREATE FULLTEXT INDEX",
                    IndexKind::Spatial => "CREATE SPATIAL INDEX",
                    _ => "CREATE INDEX",
                };
                let mut sql = format!(
                    "{prefix} {} ON {table} ({columns})",
                    Dialect::MySQL.quote(&idx.get_name())
                );
                if !idx.comment.is_empty() {
                    sql.push_str(" COMMENT ");
                    sql.push_str(&quote_literal(&idx.comment));
                }
                sql
            })
            .collect()
    }

    pub fn drop_index(&self, database: &str, table: &str, name: &str) -> String {
        format!(
            "DROP INDEX {} ON {}",
            Dialect::MySQL.quote(name),
            Dialect::MySQL.quote_table(database, table)
        )
    }

    pub fn drop_table(&self, database: &str, table: &str, if_exists: bool) -> String {
        format!(
            "DROP TABLE {}{}",
            if if_exists { "IF EXISTS " } else { "" },
            Dialect::MySQL.quote_table(database, table)
        )
    }

    pub fn truncate_table(&self, database: &str, table: &str) -> String {
        format!("TRUNCATE TABLE {}", Dialect::MySQL.quote_table(database, table))
    }

    pub fn rename_table(&self, database: &str, old: &str, new: &str) -> String {
        format!(
            "RENAME TABLE {} TO {}",
            Dialect::MySQL.quote_table(database, old),
            Dialect::MySQL.quote_table(database, new)
        )
    }

    pub fn rename_column(&self, database: &str, table: &str, old: &str, new: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            Dialect::MySQL.quote_table(database, table),
            Dialect::MySQL.quote(old),
            Dialect::MySQL.quote(new)
        )
    }

    pub fn drop_column(&self, database: &str, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            Dialect::MySQL.quote_table(database, table),
            Dialect::MySQL.quote(column)
        )
    }

    /// `TABLE_SCHEMA = ?`；库名为空时取当前库。
    fn schema_filter(database: &str, args: &mut Vec<SqlValue>) -> &'static str {
        if database.is_empty() {
            "TABLE_SCHEMA = DATABASE()"
        } else {
            args.push(SqlValue::from(database.to_string()));
            "TABLE_SCHEMA = ?"
        }
    }

    /// 查询表是否存在（返回计数）。
    pub fn has_table(&self, database: &str, table: &str) -> (String, Vec<SqlValue>) {
        let mut args = Vec::new();
        let filter = Self::schema_filter(database, &mut args);
        args.push(SqlValue::from(table.to_string()));
        args.push(SqlValue::from("BASE TABLE"));
        (
            format!(
                "SELECT COUNT(*) FROM information_schema.TABLES WHERE {filter} AND TABLE_NAME = ? AND TABLE_TYPE = ?"
            ),
            args,
        )
    }

    /// 查询表的列信息。
    pub fn get_columns(&self, database: &str, table: &str) -> (String, Vec<SqlValue>) {
        let mut args = Vec::new();
        let filter = Self::schema_filter(database, &mut args);
        args.push(SqlValue::from(table.to_string()));
        (
            format!(
                "SELECT ORDINAL_POSITION, COLUMN_NAME, COLUMN_TYPE, COLUMN_DEFAULT, IS_NULLABLE, DATA_TYPE, CHARACTER_SET_NAME, COLLATION_NAME, EXTRA FROM information_schema.COLUMNS WHERE {filter} AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION"
            ),
            args,
        )
    }

    /// 查询表的索引信息。
    pub fn get_indexes(&self, database: &str, table: &str) -> (String, Vec<SqlValue>) {
        let mut args = Vec::new();
        let filter = Self::schema_filter(database, &mut args);
        args.push(SqlValue::from(table.to_string()));
        (
            format!(
                "SELECT DISTINCT INDEX_NAME, INDEX_TYPE, NON_UNIQUE FROM information_schema.STATISTICS WHERE {filter} AND TABLE_NAME = ?"
            ),
            args,
        )
    }
}
