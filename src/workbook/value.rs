// ==========================================
// 配置工作簿 - 字段类型与输出值
// ==========================================
// 职责: 目标类型定义、类型转换、输出记录结构
// 序列化: 按值类型输出，不依赖运行时类型检查
// ==========================================

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

/// 目标字段类型
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Boolean,
    List,
    Map,
    Tag,
    /// 未识别的类型名，按原样透传
    Other(String),
}

impl From<&str> for FieldType {
    fn from(value: &str) -> Self {
        match value.trim() {
            "" | "string" => FieldType::String,
            "number" | "numeric" => FieldType::Number,
            "boolean" | "bool" => FieldType::Boolean,
            "list" => FieldType::List,
            "map" | "hash" => FieldType::Map,
            "tag" => FieldType::Tag,
            other => FieldType::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        FieldType::from(value.as_str())
    }
}

/// 输出字段值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<String>),
    Map(Vec<(String, String)>),
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::String(s) => serializer.serialize_str(s),
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            FieldValue::Map(entries) => serialize_pairs(serializer, entries),
        }
    }
}

fn serialize_pairs<S: Serializer>(serializer: S, entries: &[(String, String)]) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (key, value) in entries {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

/// 按目标类型转换原始字符串
///
/// 转换失败不报错: 数值 → 0，布尔 → false，列表/字典 空串 → 空集合。
pub fn coerce(raw: &str, field_type: &FieldType) -> FieldValue {
    match field_type {
        FieldType::Number => FieldValue::Number(parse_number(raw)),
        FieldType::Boolean => FieldValue::Bool(parse_bool(raw)),
        FieldType::List => FieldValue::List(split_list(raw)),
        FieldType::Map => FieldValue::Map(split_map(raw)),
        FieldType::String | FieldType::Tag | FieldType::Other(_) => FieldValue::String(raw.to_string()),
    }
}

fn parse_number(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "t" | "T" | "TRUE" | "true" | "True")
}

fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(str::to_string).collect()
}

fn split_map(raw: &str) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = Vec::new();
    for item in split_list(raw) {
        let (key, value) = match item.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (item, String::new()),
        };
        upsert(&mut entries, key, value);
    }
    entries
}

/// 插入或覆盖（覆盖时保持原位置）
fn upsert<V>(entries: &mut Vec<(String, V)>, key: String, value: V) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

/// 单词首字母大写（字母/数字/下划线之外的字符视为分隔符）
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for ch in input.chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !(ch.is_alphanumeric() || ch == '_');
    }
    out
}

/// 输出记录
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputRecord {
    fields: Vec<(String, FieldValue)>,
    tags: Vec<(String, String)>,
    /// 原始分类值（不参与序列化）
    category: Option<String>,
}

/// 标签子字典的保留键
pub const TAGS_KEY: &str = "tags";

impl OutputRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, value: FieldValue) {
        upsert(&mut self.fields, name, value);
    }

    pub fn insert_tag(&mut self, name: String, value: String) {
        upsert(&mut self.tags, name, value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let pos = self.fields.iter().position(|(k, _)| k == name)?;
        Some(self.fields.remove(pos).1)
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = Some(category.into());
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

impl Serialize for OutputRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body: Vec<&(String, FieldValue)> = self.fields.iter().filter(|(k, _)| k != TAGS_KEY).collect();
        let mut map = serializer.serialize_map(Some(body.len() + 1))?;
        for (key, value) in body {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(TAGS_KEY, &TagMap(&self.tags))?;
        map.end()
    }
}

struct TagMap<'a>(&'a [(String, String)]);

impl Serialize for TagMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_pairs(serializer, self.0)
    }
}
