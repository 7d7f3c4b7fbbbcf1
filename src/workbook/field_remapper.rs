// ==========================================
// 配置工作簿 - 字段重映射器
// ==========================================
// 职责: 原始记录 → 类型化输出记录
// 流程: 目标名/类型解析 → 类型转换 → 查找表替换 → 标签归集 → 过滤
// ==========================================

use crate::workbook::lookup::LookupResolver;
use crate::workbook::record_normalizer::RawRecord;
use crate::workbook::schema::SchemaMapping;
use crate::workbook::value::{coerce, title_case, FieldType, FieldValue, OutputRecord};
use crate::workbook::workbook_trait::RecordMapper;
use tracing::{debug, trace};

/// 通过映射文档解析的列前缀
pub const SCHEMA_PREFIX: &str = "attr";

/// 命名约定前缀 → 目标类型（前缀区分大小写）
const CONVENTIONS: &[(&str, FieldType)] = &[
    ("s_", FieldType::String),
    ("string_", FieldType::String),
    ("n_", FieldType::Number),
    ("num_", FieldType::Number),
    ("number_", FieldType::Number),
    ("numeric_", FieldType::Number),
    ("b_", FieldType::Boolean),
    ("bool_", FieldType::Boolean),
    ("boolean_", FieldType::Boolean),
    ("l_", FieldType::List),
    ("list_", FieldType::List),
    ("m_", FieldType::Map),
    ("map_", FieldType::Map),
    ("h_", FieldType::Map),
    ("hash_", FieldType::Map),
    ("t_", FieldType::Tag),
    ("tag_", FieldType::Tag),
];

/// 按命名约定推断 (目标名, 类型)；无匹配前缀返回 None
pub fn infer_from_convention(column: &str) -> Option<(String, FieldType)> {
    CONVENTIONS.iter().find_map(|(prefix, field_type)| {
        column
            .strip_prefix(prefix)
            .map(|name| (name.to_string(), field_type.clone()))
    })
}

/// 过滤条件：列名（原始列名或目标名）+ 允许值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub name: String,
    pub values: Vec<String>,
}

impl FieldFilter {
    fn matches(&self, column: &str, raw: &str) -> bool {
        self.name == column && self.values.iter().any(|v| v == raw)
    }
}

pub struct FieldRemapper<'a> {
    schema: SchemaMapping,
    category_column: String,
    filters: Vec<FieldFilter>,
    lookups: LookupResolver<'a>,
}

impl<'a> FieldRemapper<'a> {
    pub fn new(
        schema: SchemaMapping,
        category_column: impl Into<String>,
        filters: Vec<FieldFilter>,
        lookups: LookupResolver<'a>,
    ) -> Self {
        Self {
            schema,
            category_column: category_column.into(),
            filters,
            lookups,
        }
    }

    /// 重映射全部记录，丢弃未通过过滤的记录
    pub fn remap(&self, records: &[RawRecord]) -> Vec<OutputRecord> {
        let output: Vec<OutputRecord> = records
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| self.map_record(record, idx + 1))
            .collect();

        debug!(
            input = records.len(),
            output = output.len(),
            filtered = records.len() - output.len(),
            "字段重映射完成"
        );
        output
    }

    /// 解析单列的目标名和类型
    fn resolve_field(&self, category: &str, column: &str) -> (String, FieldType) {
        if column == self.category_column {
            return (column.to_string(), FieldType::String);
        }
        if column.starts_with(SCHEMA_PREFIX) {
            return self.schema.resolve(category, column);
        }
        infer_from_convention(column).unwrap_or_else(|| (column.to_string(), FieldType::String))
    }

    fn is_filtered_in(&self, column: &str, target: &str, raw: &str) -> bool {
        self.filters
            .iter()
            .any(|f| f.matches(column, raw) || f.matches(target, raw))
    }
}

impl RecordMapper for FieldRemapper<'_> {
    fn map_record(&self, record: &RawRecord, row_number: usize) -> Option<OutputRecord> {
        let raw_category = record.get(&self.category_column);
        let category = raw_category.unwrap_or("");
        let mut output = OutputRecord::new();
        if let Some(value) = raw_category {
            output.set_category(value);
        }
        let mut included = self.filters.is_empty();

        for (column, raw) in record.iter() {
            let (target, field_type) = self.resolve_field(category, column);

            if !included && self.is_filtered_in(column, &target, raw) {
                included = true;
            }

            if target.is_empty() {
                trace!(row = row_number, column = column, "目标字段名为空，丢弃");
                continue;
            }

            let mut value = coerce(raw, &field_type);
            if let FieldValue::String(current) = &value {
                if let Some(resolved) = self.lookups.resolve(&target, current) {
                    value = FieldValue::String(resolved);
                }
            }

            match (field_type, value) {
                (FieldType::Tag, FieldValue::String(tag)) => output.insert_tag(title_case(&target), tag),
                (_, value) => output.insert(target, value),
            }
        }

        if !included {
            trace!(row = row_number, "记录未通过过滤");
            return None;
        }
        Some(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::lookup::{Lookup, LookupSource, SpreadsheetDefaults};

    fn remapper(schema: SchemaMapping, filters: Vec<FieldFilter>, lookups: Vec<Lookup>) -> FieldRemapper<'static> {
        FieldRemapper::new(
            schema,
            "configuration_item",
            filters,
            LookupResolver::new(lookups, SpreadsheetDefaults::default()),
        )
    }

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_convention_inference() {
        assert_eq!(infer_from_convention("n_amount"), Some(("amount".to_string(), FieldType::Number)));
        assert_eq!(infer_from_convention("numeric_x"), Some(("x".to_string(), FieldType::Number)));
        assert_eq!(infer_from_convention("boolean_on"), Some(("on".to_string(), FieldType::Boolean)));
        assert_eq!(infer_from_convention("hash_cfg"), Some(("cfg".to_string(), FieldType::Map)));
        assert_eq!(infer_from_convention("N_amount"), None);
        assert_eq!(infer_from_convention("name"), None);
    }

    #[test]
    fn test_convention_coercion() {
        let mapper = remapper(SchemaMapping::default(), vec![], vec![]);
        let rec = record(&[
            ("configuration_item", "vm"),
            ("n_amount", "3.5"),
            ("b_flag", ""),
            ("l_tags", "a,b,c"),
            ("m_cfg", "x=1,y=2"),
            ("t_owner", "ops"),
            ("s_label", "web"),
        ]);

        let out = mapper.map_record(&rec, 1).unwrap();
        assert_eq!(out.get("amount"), Some(&FieldValue::Number(3.5)));
        assert_eq!(out.get("flag"), Some(&FieldValue::Bool(false)));
        assert_eq!(
            out.get("tags"),
            Some(&FieldValue::List(vec!["a".into(), "b".into(), "c".into()]))
        );
        assert_eq!(
            out.get("cfg"),
            Some(&FieldValue::Map(vec![("x".into(), "1".into()), ("y".into(), "2".into())]))
        );
        assert_eq!(out.tag("Owner"), Some("ops"));
        assert!(out.get("owner").is_none());
        assert_eq!(out.get("label"), Some(&FieldValue::String("web".into())));
        assert_eq!(out.get("configuration_item"), Some(&FieldValue::String("vm".into())));
    }

    #[test]
    fn test_attr_columns_use_schema() {
        let schema = SchemaMapping::parse(
            "config_schema:\n  vm:\n    attr1: hostname\n    attr2: {name: cpu, type: number}\n    attr3: {type: string}\n    attr4: {name: owner, type: tag}\n",
        )
        .unwrap();
        let mapper = remapper(schema, vec![], vec![]);
        let rec = record(&[
            ("configuration_item", "vm"),
            ("attr1", "web01"),
            ("attr2", "4"),
            ("attr3", "dropped"),
            ("attr4", "ops"),
            ("attr5", "kept"),
        ]);

        let out = mapper.map_record(&rec, 1).unwrap();
        assert_eq!(out.get("hostname"), Some(&FieldValue::String("web01".into())));
        assert_eq!(out.get("cpu"), Some(&FieldValue::Number(4.0)));
        assert!(out.get("attr3").is_none());
        assert_eq!(out.tag("Owner"), Some("ops"));
        assert_eq!(out.get("attr5"), Some(&FieldValue::String("kept".into())));
    }

    #[test]
    fn test_filters_match_raw_or_target_name() {
        let filters = vec![FieldFilter {
            name: "env".to_string(),
            values: vec!["prod".to_string()],
        }];
        let mapper = remapper(SchemaMapping::default(), filters, vec![]);

        let prod = record(&[("name", "web01"), ("s_env", "prod")]);
        let dev = record(&[("name", "web02"), ("s_env", "dev")]);
        assert!(mapper.map_record(&prod, 1).is_some());
        assert!(mapper.map_record(&dev, 2).is_none());
    }

    #[test]
    fn test_lookup_applied_to_target_name() {
        let lookups = vec![Lookup {
            column: "owner_id".to_string(),
            source: LookupSource::Json(r#"{"101":"Team-A"}"#.to_string()),
            key_column: "id".to_string(),
            value_column: "team".to_string(),
        }];
        let mapper = remapper(SchemaMapping::default(), vec![], lookups);

        let out = mapper.map_record(&record(&[("owner_id", "101,102")]), 1).unwrap();
        assert_eq!(out.get("owner_id"), Some(&FieldValue::String("Team-A,".into())));

        let out = mapper.map_record(&record(&[("s_owner_id", "101")]), 1).unwrap();
        assert_eq!(out.get("owner_id"), Some(&FieldValue::String("Team-A".into())));
    }

    #[test]
    fn test_remap_drops_filtered_records() {
        let filters = vec![FieldFilter {
            name: "env".to_string(),
            values: vec!["prod".to_string()],
        }];
        let mapper = remapper(SchemaMapping::default(), filters, vec![]);
        let records = vec![
            record(&[("env", "prod")]),
            record(&[("env", "dev")]),
            record(&[("env", "prod")]),
        ];
        assert_eq!(mapper.remap(&records).len(), 2);
    }
}
