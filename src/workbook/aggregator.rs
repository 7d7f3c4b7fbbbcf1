// ==========================================
// 配置工作簿 - 分组与序列化
// ==========================================
// 职责: 按分类值分组输出记录，序列化为 JSON / YAML
// 顺序: 分组按首次出现顺序，组内保持插入顺序
// ==========================================

use crate::workbook::error::{WorkbookError, WorkbookResult};
use crate::workbook::value::OutputRecord;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::str::FromStr;
use tracing::warn;

/// 输出文档：分类值 → 记录列表
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    groups: Vec<(String, Vec<OutputRecord>)>,
}

impl Document {
    pub fn group(&self, name: &str) -> Option<&[OutputRecord]> {
        self.groups
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, records)| records.as_slice())
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|(_, records)| records.len()).sum()
    }

    fn push(&mut self, name: &str, record: OutputRecord) {
        match self.groups.iter_mut().find(|(k, _)| k == name) {
            Some((_, records)) => records.push(record),
            None => self.groups.push((name.to_string(), vec![record])),
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (name, records) in &self.groups {
            map.serialize_entry(name, records)?;
        }
        map.end()
    }
}

/// 未观察到分类值时使用的分组名
///
/// 优先使用调用方提供的默认分类值，否则使用分类列名。
pub fn default_group_name(default_category: &str, category_column: &str) -> String {
    if default_category.is_empty() {
        category_column.to_string()
    } else {
        default_category.to_string()
    }
}

/// 分组
///
/// # 参数
/// - records: 过滤后的输出记录
/// - categories: 原始数据中观察到的分类值（首次出现顺序）
/// - category_column: 分类列名
/// - default_category: 默认分类值
///
/// # 说明
/// - 有分类值时，按分类值分组并从记录体中移除分类字段；没有记录的分组不输出
/// - 没有任何分类值时，所有记录原样放入默认分组（即使为空列表）
pub fn aggregate(
    records: Vec<OutputRecord>,
    categories: &[String],
    category_column: &str,
    default_category: &str,
) -> Document {
    let mut document = Document::default();

    if categories.is_empty() {
        document
            .groups
            .push((default_group_name(default_category, category_column), records));
        return document;
    }

    for name in categories {
        document.groups.push((name.clone(), Vec::new()));
    }

    for mut record in records {
        // 分组键取原始分类值；同名的派生字段（如 n_<分类列>）一并移除
        record.remove(category_column);
        let Some(key) = record.category().map(str::to_string) else {
            warn!(category_column = category_column, "记录缺少分类值，已丢弃");
            continue;
        };
        document.push(&key, record);
    }

    document.groups.retain(|(_, records)| !records.is_empty());
    document
}

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// 紧凑 JSON
    #[default]
    Json,
    /// 缩进 JSON
    Pretty,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = WorkbookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "pretty" => Ok(OutputFormat::Pretty),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(WorkbookError::SerializeError(format!("未知的输出格式: {}", other))),
        }
    }
}

/// 序列化输出文档
pub fn render(document: &Document, format: OutputFormat) -> WorkbookResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(document)?),
        OutputFormat::Pretty => Ok(serde_json::to_string_pretty(document)?),
        OutputFormat::Yaml => {
            serde_yaml::to_string(document).map_err(|e| WorkbookError::SerializeError(e.to_string()))
        }
    }
}
