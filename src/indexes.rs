//! 索引定义与确定性命名。

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexKind {
    #[default]
    BTree,
    Unique,
    Primary,
    FullText,
    Spatial,
}

impl IndexKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BTree => "BTREE",
            Self::Unique => "UNIQUE",
            Self::Primary => "PRIMARY",
            Self::FullText => "FULLTEXT",
            Self::Spatial => "SPATIAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexColumn {
    pub name: String,
    pub direction: Direction,
}

pub fn asc_column(name: impl Into<String>) -> IndexColumn {
    IndexColumn {
        name: name.into(),
        direction: Direction::Ascending,
    }
}

pub fn desc_column(name: impl Into<String>) -> IndexColumn {
    IndexColumn {
        name: name.into(),
        direction: Direction::Descending,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// 为空时使用 [`Index::hash_name`]。
    pub name: String,
    pub kind: IndexKind,
    pub columns: Vec<IndexColumn>,
    pub comment: String,
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(hash: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(hash, |h, b| (h ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

impl Index {
    /// 列不能为空。
    pub fn new(kind: IndexKind, columns: impl IntoIterator<Item = IndexColumn>) -> Self {
        let columns: Vec<IndexColumn> = columns.into_iter().collect();
        assert!(!columns.is_empty(), "index: at least one column is required");
        Self {
            name: String::new(),
            kind,
            columns,
            comment: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// 由类型与列（含方向）计算的名称，跨进程稳定。
    pub fn hash_name(&self) -> String {
        let mut h = fnv1a(FNV_OFFSET, self.kind.as_str().as_bytes());
        for c in &self.columns {
            h = fnv1a(h, b"|");
            h = fnv1a(h, c.name.as_bytes());
            h = fnv1a(
                h,
                match c.direction {
                    Direction::Ascending => b"@ASC".as_slice(),
                    Direction::Descending => b"@DESC".as_slice(),
                },
            );
        }
        hex::encode(h.to_be_bytes())
    }

    pub fn get_name(&self) -> String {
        if self.name.is_empty() {
            self.hash_name()
        } else {
            self.name.clone()
        }
    }
}
