// ==========================================
// 配置工作簿 - 查找表解析器
// ==========================================
// 职责: 按 (触发列, 原始值) 从外部键值数据源取替换值
// 数据源: 内联 JSON / 内联 YAML / 内联 INI + 节 / 工作表
// 约束: 每个查找表在单次调用内最多加载一次；未命中返回空串
// ==========================================

use crate::workbook::error::{WorkbookError, WorkbookResult};
use crate::workbook::ini::parse_ini;
use crate::workbook::sheet_reader::ExcelWorkbook;
use crate::workbook::workbook_trait::SheetProvider;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// 查找表数据源（已校验，恰好一种）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupSource {
    Json(String),
    Yaml(String),
    Ini {
        text: String,
        section: String,
    },
    /// 工作表；未指定的文件/密码/工作表名回退到主数据源
    Worksheet {
        excel: Option<PathBuf>,
        password: Option<String>,
        worksheet: Option<String>,
    },
}

/// 查找表定义
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    /// 触发列（按目标字段名匹配）
    pub column: String,
    pub source: LookupSource,
    pub key_column: String,
    pub value_column: String,
}

/// 主数据源为工作簿时提供的默认值
#[derive(Default)]
pub struct SpreadsheetDefaults<'a> {
    pub provider: Option<&'a dyn SheetProvider>,
    pub password: Option<String>,
    pub worksheet: Option<String>,
}

type LookupTable = HashMap<String, String>;

struct LookupEntry {
    lookup: Lookup,
    table: OnceCell<Option<LookupTable>>,
}

/// 查找表解析器（单次调用内使用）
pub struct LookupResolver<'a> {
    entries: Vec<LookupEntry>,
    defaults: SpreadsheetDefaults<'a>,
}

impl<'a> LookupResolver<'a> {
    pub fn new(lookups: Vec<Lookup>, defaults: SpreadsheetDefaults<'a>) -> Self {
        let entries = lookups
            .into_iter()
            .map(|lookup| LookupEntry {
                lookup,
                table: OnceCell::new(),
            })
            .collect();
        Self { entries, defaults }
    }

    /// 解析字段值
    ///
    /// # 返回
    /// - None: 该列未配置查找表，调用方保留原值
    /// - Some(String): 逗号分隔的各 token 逐个替换后重新拼接；未命中的 token 为空串
    pub fn resolve(&self, column: &str, value: &str) -> Option<String> {
        let entry = self.entries.iter().find(|e| e.lookup.column == column)?;
        let table = entry.table.get_or_init(|| self.load(&entry.lookup));

        let resolved: Vec<&str> = value
            .split(',')
            .map(|token| {
                table
                    .as_ref()
                    .and_then(|t| t.get(token))
                    .map(String::as_str)
                    .unwrap_or("")
            })
            .collect();
        Some(resolved.join(","))
    }

    fn load(&self, lookup: &Lookup) -> Option<LookupTable> {
        match self.load_table(lookup) {
            Ok(table) => {
                debug!(column = %lookup.column, entries = table.len(), "查找表加载完成");
                Some(table)
            }
            Err(e) => {
                warn!(column = %lookup.column, error = %e, "查找表加载失败，相关值解析为空");
                None
            }
        }
    }

    fn load_table(&self, lookup: &Lookup) -> WorkbookResult<LookupTable> {
        match &lookup.source {
            LookupSource::Json(text) => json_table(text),
            LookupSource::Yaml(text) => yaml_table(text),
            LookupSource::Ini { text, section } => {
                Ok(parse_ini(text).remove(section).unwrap_or_default().into_iter().collect())
            }
            LookupSource::Worksheet {
                excel,
                password,
                worksheet,
            } => {
                let sheet = worksheet
                    .clone()
                    .or_else(|| self.defaults.worksheet.clone())
                    .ok_or_else(|| WorkbookError::SheetNotFound("<未指定工作表>".to_string()))?;

                let rows = match excel {
                    Some(path) => {
                        let password = password.clone().or_else(|| self.defaults.password.clone());
                        ExcelWorkbook::new(path, password).read_rows(&sheet)?
                    }
                    None => match self.defaults.provider {
                        Some(provider) => provider.read_rows(&sheet)?,
                        None => {
                            return Err(WorkbookError::WorkbookOpenError {
                                path: String::new(),
                                message: "查找表未指定 excel 文件且主数据源不是工作簿".to_string(),
                            })
                        }
                    },
                };
                Ok(sheet_table(&rows, &lookup.key_column, &lookup.value_column))
            }
        }
    }
}

fn json_table(text: &str) -> WorkbookResult<LookupTable> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| WorkbookError::DocumentParseError(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| WorkbookError::DocumentParseError("json 查找表必须是对象".to_string()))?;

    Ok(object
        .iter()
        .filter_map(|(k, v)| json_scalar(v).map(|s| (k.clone(), s)))
        .collect())
}

fn json_scalar(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn yaml_table(text: &str) -> WorkbookResult<LookupTable> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| WorkbookError::DocumentParseError(e.to_string()))?;
    let mapping = value
        .as_mapping()
        .ok_or_else(|| WorkbookError::DocumentParseError("yaml 查找表必须是映射".to_string()))?;

    Ok(mapping
        .iter()
        .filter_map(|(k, v)| Some((yaml_scalar(k)?, yaml_scalar(v)?)))
        .collect())
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 工作表 → 键值表（第 0 行为表头；键列找不到时使用第一列，值列找不到时为空表）
fn sheet_table(rows: &[Vec<String>], key_column: &str, value_column: &str) -> LookupTable {
    let Some(header) = rows.first() else {
        return LookupTable::new();
    };
    let key_idx = header.iter().position(|h| h == key_column).unwrap_or(0);
    let Some(value_idx) = header.iter().position(|h| h == value_column) else {
        return LookupTable::new();
    };

    rows[1..]
        .iter()
        .filter_map(|row| Some((row.get(key_idx)?.clone(), row.get(value_idx)?.clone())))
        .collect()
}
