//! Mapper：把 struct 的类型描述展开成字段树，并按类型缓存。
//!
//! 展开按层（队列）进行：
//! - 非导出且非嵌入的字段跳过；tag 名为 `-` 的字段跳过；
//! - `nullable` 从祖先向下传播；
//! - 嵌入且没有显式名称的字段，其子字段沿用外层路径前缀（字段提升）；
//! - 指回祖先类型的字段视为叶子，不再展开。
//!
//! 展开完成后按遍历下标排序，再解析出 `properties`（去重后的列集合）与 `names` 索引；
//! 同名冲突时浅层（外层）字段胜出，被覆盖的字段仍可通过遍历下标访问。

use crate::field_mapper::{FieldMapperFunc, identity_mapper};
use crate::reflect::{Reflect, Type};
use crate::value::SqlValue;
use std::any::TypeId;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// 解析后的字段 tag：`name,key,key=value,...`。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    name: String,
    opts: HashMap<String, String>,
}

impl Tag {
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(',');
        let name = parts.next().unwrap_or("").trim().to_string();
        let mut opts = HashMap::new();
        for part in parts {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match part.split_once('=') {
                Some((k, v)) => opts.insert(k.trim().to_lowercase(), v.trim().to_string()),
                None => opts.insert(part.to_lowercase(), String::new()),
            };
        }
        Self { name, opts }
    }

    /// tag 中显式给出的名称（第一段）。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 查找选项；只有 key 的选项返回 `Some("")`。
    pub fn look_up(&self, key: &str) -> Option<&str> {
        self.opts.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.opts.contains_key(key)
    }
}

/// 字段树中的一个节点。
#[derive(Debug, Clone)]
pub struct StructField {
    name: String,
    path: String,
    ty: Type,
    index: Vec<usize>,
    tag: Tag,
    nullable: bool,
    embedded: bool,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl StructField {
    /// 逻辑名（tag 名或经过 mapper 的字段名）。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 点分路径。
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// 从根开始的遍历下标。
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    /// 嵌入且没有显式名称：只是命名空间的载体，本身不对应列。
    fn is_promoting(&self) -> bool {
        self.embedded && self.tag.name().is_empty()
    }
}

/// 一个 struct 类型展开后的结果，构建后只读。
#[derive(Debug)]
pub struct Struct {
    type_id: Option<TypeId>,
    type_name: &'static str,
    fields: Vec<StructField>,
    properties: Vec<usize>,
    names: HashMap<String, usize>,
    indexes: HashMap<Vec<usize>, usize>,
}

impl Struct {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// 所有字段（按遍历下标排序，包含被覆盖的重名字段）。
    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    /// 去重后的列字段，按遍历下标排序。
    pub fn properties(&self) -> Vec<&StructField> {
        self.properties.iter().map(|&i| &self.fields[i]).collect()
    }

    /// 按名称（路径）查找：先精确匹配，再忽略大小写匹配。
    pub fn look_up_field_by_name(&self, name: &str) -> Option<&StructField> {
        if let Some(&i) = self.names.get(name) {
            return Some(&self.fields[i]);
        }
        self.names
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, &i)| &self.fields[i])
            .min_by(|a, b| a.index.cmp(&b.index))
    }

    /// 按遍历下标查找。
    pub fn get_by_traversal(&self, index: &[usize]) -> Option<&StructField> {
        self.indexes.get(index).map(|&i| &self.fields[i])
    }

    pub fn parent_field(&self, field: &StructField) -> Option<&StructField> {
        field.parent.map(|i| &self.fields[i])
    }

    pub fn children(&self, field: &StructField) -> Vec<&StructField> {
        field.children.iter().map(|&i| &self.fields[i]).collect()
    }

    /// 最近的非提升祖先；直接挂在根（或经提升挂在根）上时返回 None。
    pub fn column_ancestor(&self, field: &StructField) -> Option<&StructField> {
        let mut cur = self.parent_field(field);
        while let Some(p) = cur {
            if !p.is_promoting() {
                return Some(p);
            }
            cur = self.parent_field(p);
        }
        None
    }

    /// 最外层的非提升祖先，即在表中真正持有该字段的列（通常是 JSON 列）。
    pub fn column_root(&self, field: &StructField) -> Option<&StructField> {
        let mut root = None;
        let mut cur = self.parent_field(field);
        while let Some(p) = cur {
            if !p.is_promoting() {
                root = Some(p);
            }
            cur = self.parent_field(p);
        }
        root
    }

    /// 按 `properties()` 的顺序取出 `v` 的字段值。
    ///
    /// `v` 必须是构建该 `Struct` 的类型，否则 panic。
    pub fn values_of<T: Reflect>(&self, v: &T) -> Vec<SqlValue> {
        assert_eq!(
            self.type_id,
            Some(TypeId::of::<T>()),
            "values_of: value type {} does not match struct {}",
            std::any::type_name::<T>(),
            self.type_name
        );
        self.properties()
            .into_iter()
            .map(|sf| v.value_at(sf.index()).unwrap_or(SqlValue::Null))
            .collect()
    }
}

struct Pending {
    ty: Type,
    parent: Option<usize>,
    prefix: String,
    nullable: bool,
    ancestors: Vec<TypeId>,
}

fn build_struct(root: &Type, fmt: &FieldMapperFunc) -> Struct {
    let root = root.deref();
    assert!(
        root.is_struct(),
        "mapper: expected a struct type, got {:?} ({})",
        root.kind(),
        root.name()
    );

    let mut fields: Vec<StructField> = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back(Pending {
        ty: root.clone(),
        parent: None,
        prefix: String::new(),
        nullable: false,
        ancestors: root.type_id().into_iter().collect(),
    });

    while let Some(q) = queue.pop_front() {
        let parent_index: Vec<usize> = q
            .parent
            .map(|p| fields[p].index.clone())
            .unwrap_or_default();

        for (i, desc) in q.ty.fields().unwrap_or_default().into_iter().enumerate() {
            if !desc.exported && !desc.embedded {
                continue;
            }
            let tag = Tag::parse(desc.tag);
            if tag.name() == "-" {
                continue;
            }

            let name = if tag.name().is_empty() {
                fmt(desc.name)
            } else {
                tag.name().to_string()
            };
            let path = if q.prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", q.prefix, name)
            };
            let mut index = parent_index.clone();
            index.push(i);

            let elem = desc.ty.deref().clone();
            let nullable = q.nullable || desc.ty.kind().is_nullable();
            let embedded = desc.embedded && elem.is_struct();
            let explicit = !tag.name().is_empty();

            let id = fields.len();
            fields.push(StructField {
                name,
                path: path.clone(),
                ty: desc.ty,
                index,
                tag,
                nullable,
                embedded,
                parent: q.parent,
                children: Vec::new(),
            });
            if let Some(p) = q.parent {
                fields[p].children.push(id);
            }

            if !elem.is_struct() {
                continue;
            }
            let recursive = elem
                .type_id()
                .map(|t| q.ancestors.contains(&t))
                .unwrap_or(false);
            if recursive {
                continue;
            }
            let mut ancestors = q.ancestors.clone();
            ancestors.extend(elem.type_id());
            queue.push_back(Pending {
                ty: elem,
                parent: Some(id),
                prefix: if embedded && !explicit {
                    q.prefix.clone()
                } else {
                    path
                },
                nullable,
                ancestors,
            });
        }
    }

    // 按遍历下标重排，同时重写 parent/children 引用
    let mut order: Vec<usize> = (0..fields.len()).collect();
    order.sort_by(|&a, &b| fields[a].index.cmp(&fields[b].index));
    let mut remap = vec![0; fields.len()];
    for (new, &old) in order.iter().enumerate() {
        remap[old] = new;
    }
    let mut slots: Vec<Option<StructField>> = fields.into_iter().map(Some).collect();
    let mut fields: Vec<StructField> = Vec::with_capacity(slots.len());
    for &old in &order {
        if let Some(mut sf) = slots[old].take() {
            sf.parent = sf.parent.map(|p| remap[p]);
            sf.children = sf.children.iter().map(|&c| remap[c]).collect();
            fields.push(sf);
        }
    }

    let mut s = Struct {
        type_id: root.type_id(),
        type_name: root.name(),
        fields,
        properties: Vec::new(),
        names: HashMap::new(),
        indexes: HashMap::new(),
    };

    for (i, sf) in s.fields.iter().enumerate() {
        s.indexes.insert(sf.index.clone(), i);
    }

    let mut names: HashMap<String, usize> = HashMap::new();
    let mut properties: Vec<usize> = Vec::new();
    for (i, sf) in s.fields.iter().enumerate() {
        if sf.name.is_empty() || sf.is_promoting() {
            continue;
        }
        let depth = sf.index.len();

        match names.get(&sf.path) {
            Some(&prev) if s.fields[prev].index.len() < depth => {}
            _ => {
                names.insert(sf.path.clone(), i);
            }
        }

        if s.column_ancestor(sf).is_some() {
            continue;
        }
        match properties
            .iter()
            .position(|&p| s.fields[p].name.eq_ignore_ascii_case(&sf.name))
        {
            Some(pos) if s.fields[properties[pos]].index.len() < depth => {}
            Some(pos) => {
                properties.remove(pos);
                properties.push(i);
            }
            None => properties.push(i),
        }
    }
    properties.sort_by(|&a, &b| s.fields[a].index.cmp(&s.fields[b].index));
    s.names = names;
    s.properties = properties;
    s
}

/// 映射上下文：持有类型缓存与字段名 mapper。
///
/// 同一个 `Mapper` 可以在线程间共享；缓存在进程生命周期内只增不减。
pub struct Mapper {
    fmt: FieldMapperFunc,
    cache: Mutex<HashMap<TypeId, Arc<Struct>>>,
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self.cache.lock().map(|c| c.len()).unwrap_or_default();
        f.debug_struct("Mapper").field("cached", &cached).finish()
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper {
    pub fn new() -> Self {
        Self::with_field_mapper(identity_mapper())
    }

    /// tag 未给出名称时，用 `fmt` 把字段名转换为列名。
    pub fn with_field_mapper(fmt: FieldMapperFunc) -> Self {
        Self {
            fmt,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// 取得 `T` 的展开结果；首次调用时构建并缓存。
    pub fn codec_by_type<T: Reflect>(&self) -> Arc<Struct> {
        self.codec_of(&T::reflect_type())
    }

    /// 同 [`codec_by_type`](Self::codec_by_type)，直接接收类型描述。
    ///
    /// `ty` 不是 struct（或指向 struct 的可空包装）时 panic。
    pub fn codec_of(&self, ty: &Type) -> Arc<Struct> {
        let root = ty.deref();
        let key = match root.type_id() {
            Some(id) if root.is_struct() => id,
            _ => panic!(
                "mapper: expected a struct type, got {:?} ({})",
                root.kind(),
                root.name()
            ),
        };

        // 锁覆盖“查找 + 构建 + 写入”，同一类型不会被并发重复构建
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(s) = cache.get(&key) {
            return Arc::clone(s);
        }
        let s = Arc::new(build_struct(root, &self.fmt));
        log::debug!(
            "mapper: built {} ({} fields, {} properties)",
            s.type_name(),
            s.fields.len(),
            s.properties.len()
        );
        cache.insert(key, Arc::clone(&s));
        s
    }
}
