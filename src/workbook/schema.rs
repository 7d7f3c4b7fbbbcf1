// ==========================================
// 配置工作簿 - 映射解析器
// ==========================================
// 职责: 分类 → 源列 → (目标字段名, 目标类型)
// 来源: 显式映射文档（YAML 优先，其次 JSON）或按数据推导的默认映射
// ==========================================

use crate::workbook::aggregator::default_group_name;
use crate::workbook::error::{WorkbookError, WorkbookResult};
use crate::workbook::record_normalizer::RawRecord;
use crate::workbook::value::FieldType;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// 单列映射定义
///
/// YAML 中可以写成 `attr1: hostname`，也可以写成
/// `attr1: { name: cpu, type: number }`。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    Name(String),
    Detailed {
        #[serde(default)]
        name: String,
        #[serde(default, rename = "type")]
        field_type: FieldType,
    },
}

impl FieldSpec {
    pub fn name(&self) -> &str {
        match self {
            FieldSpec::Name(name) => name,
            FieldSpec::Detailed { name, .. } => name,
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            FieldSpec::Name(_) => FieldType::String,
            FieldSpec::Detailed { field_type, .. } => field_type.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SchemaDocument {
    #[serde(default, alias = "configuration_workbook_mapping")]
    config_schema: HashMap<String, HashMap<String, FieldSpec>>,
}

/// 分类 → 列 → 映射定义
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMapping {
    categories: HashMap<String, HashMap<String, FieldSpec>>,
}

impl SchemaMapping {
    /// 从 YAML/JSON 文本解析映射文档
    pub fn parse(text: &str) -> WorkbookResult<Self> {
        let document: SchemaDocument = parse_structured(text)?;
        Ok(Self {
            categories: document.config_schema,
        })
    }

    /// 按数据推导默认映射（每列映射到自身，类型 string）
    ///
    /// # 参数
    /// - records: 原始记录
    /// - category_column: 分类列名
    /// - default_category: 未观察到分类值时使用的分类名
    pub fn default_for(records: &[RawRecord], category_column: &str, default_category: &str) -> Self {
        let items = observed_categories(records, category_column);

        let mut columns: Vec<&str> = Vec::new();
        for record in records {
            for name in record.column_names() {
                if !columns.contains(&name) {
                    columns.push(name);
                }
            }
        }

        let buckets = if items.is_empty() {
            vec![default_group_name(default_category, category_column)]
        } else {
            items.clone()
        };

        let mut categories = HashMap::new();
        for bucket in buckets {
            let fields: HashMap<String, FieldSpec> = columns
                .iter()
                .filter(|name| items.is_empty() || **name != category_column)
                .map(|name| (name.to_string(), FieldSpec::Name(name.to_string())))
                .collect();
            categories.insert(bucket, fields);
        }

        Self { categories }
    }

    /// 解析 (分类, 源列) 对应的目标字段名和类型
    ///
    /// 分类或列不存在时回退为 (源列名, string)。
    pub fn resolve(&self, category: &str, column: &str) -> (String, FieldType) {
        match self.categories.get(category).and_then(|fields| fields.get(column)) {
            Some(spec) => (spec.name().to_string(), spec.field_type()),
            None => (column.to_string(), FieldType::String),
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// 解析映射：有显式文档则使用文档，否则推导默认映射
pub fn resolve_schema(
    schema: Option<&str>,
    records: &[RawRecord],
    category_column: &str,
    default_category: &str,
) -> WorkbookResult<SchemaMapping> {
    match schema {
        Some(text) if !text.trim().is_empty() => {
            let mapping = SchemaMapping::parse(text)?;
            debug!(categories = mapping.categories.len(), "使用显式映射");
            Ok(mapping)
        }
        _ => {
            let mapping = SchemaMapping::default_for(records, category_column, default_category);
            debug!(categories = mapping.categories.len(), "使用默认映射");
            Ok(mapping)
        }
    }
}

/// 按首次出现顺序列出去重后的分类值
pub fn observed_categories(records: &[RawRecord], category_column: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for value in records.iter().filter_map(|r| r.get(category_column)) {
        if !items.iter().any(|item| item == value) {
            items.push(value.to_string());
        }
    }
    items
}

/// 先按 YAML、再按 JSON 解析结构化文本
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> WorkbookResult<T> {
    match serde_yaml::from_str::<T>(text) {
        Ok(value) => Ok(value),
        Err(yaml_err) => serde_json::from_str::<T>(text).map_err(|json_err| {
            WorkbookError::DocumentParseError(format!("yaml: {}; json: {}", yaml_err, json_err))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<RawRecord> {
        vec![
            RawRecord::from_iter([("configuration_item", "vm"), ("attr1", "web01"), ("env", "prod")]),
            RawRecord::from_iter([("configuration_item", "disk"), ("attr1", "64"), ("env", "prod")]),
            RawRecord::from_iter([("configuration_item", "vm"), ("attr1", "web02"), ("env", "dev")]),
        ]
    }

    #[test]
    fn test_parse_yaml_schema() {
        let yaml = r#"
config_schema:
  vm:
    attr1: hostname
    attr2:
      name: cpu
      type: number
"#;
        let mapping = SchemaMapping::parse(yaml).unwrap();
        assert_eq!(mapping.resolve("vm", "attr1"), ("hostname".to_string(), FieldType::String));
        assert_eq!(mapping.resolve("vm", "attr2"), ("cpu".to_string(), FieldType::Number));
    }

    #[test]
    fn test_parse_json_schema_with_legacy_key() {
        let json = r#"{"configuration_workbook_mapping": {"disk": {"attr1": {"name": "size", "type": "numeric"}}}}"#;
        let mapping = SchemaMapping::parse(json).unwrap();
        assert_eq!(mapping.resolve("disk", "attr1"), ("size".to_string(), FieldType::Number));
    }

    #[test]
    fn test_resolve_falls_back_to_passthrough() {
        let mapping = SchemaMapping::parse("config_schema:\n  vm:\n    attr1: hostname\n").unwrap();
        assert_eq!(mapping.resolve("vm", "attr9"), ("attr9".to_string(), FieldType::String));
        assert_eq!(mapping.resolve("nic", "attr1"), ("attr1".to_string(), FieldType::String));
    }

    #[test]
    fn test_detailed_field_without_name_is_empty() {
        let mapping = SchemaMapping::parse("config_schema:\n  vm:\n    attr1:\n      type: bool\n").unwrap();
        assert_eq!(mapping.resolve("vm", "attr1"), (String::new(), FieldType::Boolean));
    }

    #[test]
    fn test_invalid_schema_text() {
        let result = SchemaMapping::parse("config_schema: [unclosed");
        assert!(matches!(result, Err(WorkbookError::DocumentParseError(_))));
    }

    #[test]
    fn test_default_mapping_per_observed_category() {
        let mapping = SchemaMapping::default_for(&records(), "configuration_item", "fallback");
        let mut categories: Vec<&str> = mapping.categories().collect();
        categories.sort();
        assert_eq!(categories, vec!["disk", "vm"]);
        assert_eq!(mapping.resolve("vm", "attr1"), ("attr1".to_string(), FieldType::String));
        assert!(!mapping.categories["vm"].contains_key("configuration_item"));
    }

    #[test]
    fn test_default_mapping_without_category_column() {
        let records = vec![RawRecord::from_iter([("attr1", "x")])];
        let mapping = SchemaMapping::default_for(&records, "configuration_item", "hosts");
        let categories: Vec<&str> = mapping.categories().collect();
        assert_eq!(categories, vec!["hosts"]);
    }

    #[test]
    fn test_observed_categories_first_seen_order() {
        assert_eq!(observed_categories(&records(), "configuration_item"), vec!["vm", "disk"]);
    }

    #[test]
    fn test_blank_schema_uses_default() {
        let mapping = resolve_schema(Some("   "), &records(), "configuration_item", "").unwrap();
        assert!(!mapping.is_empty());
    }
}
