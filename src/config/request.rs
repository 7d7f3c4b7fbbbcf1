// ==========================================
// 配置工作簿 - 转换请求配置
// ==========================================
// 职责: 请求文档（YAML/JSON）→ 类型化请求 → 校验后的转换计划
// 红线: 校验在任何数据解析之前完成
// ==========================================

use crate::config::DEFAULT_CATEGORY_COLUMN;
use crate::workbook::error::{WorkbookError, WorkbookResult};
use crate::workbook::field_remapper::FieldFilter;
use crate::workbook::lookup::{Lookup, LookupSource};
use crate::workbook::schema::parse_structured;
use crate::workbook::tabular_extractor::{ExtractOptions, Orientation};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 转换请求（边界对象，字段与请求文档一一对应）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookRequest {
    /// 内联分隔文本数据源
    pub csv: Option<String>,

    /// 工作簿数据源
    pub excel: Option<ExcelSourceSpec>,

    /// 表格方向（vertical 仅用于工作簿）
    pub orientation: Orientation,

    /// 映射文档文本（YAML/JSON）
    pub schema: Option<String>,

    /// 映射文档路径（相对请求文件目录；schema 为空时使用）
    pub schema_file: Option<PathBuf>,

    /// 分类列名（默认 configuration_item）
    #[serde(alias = "col_config_item")]
    pub category_column: Option<String>,

    /// 默认分类值
    #[serde(alias = "configuration_item")]
    pub default_category: Option<String>,

    #[serde(alias = "filter")]
    pub filters: Vec<FilterSpec>,

    #[serde(alias = "lookup")]
    pub lookups: Vec<LookupSpec>,
}

/// 工作簿数据源描述
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcelSourceSpec {
    pub path: PathBuf,
    pub password: Option<String>,
    pub worksheet: String,
    /// 起始列字母（含）
    pub col_start: Option<String>,
    /// 结束列字母（含）
    pub col_end: Option<String>,
    /// 表头覆写
    pub headers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub name: String,
    pub values: Vec<String>,
}

/// 查找表描述（数据源字段恰好填一种）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupSpec {
    pub column: String,
    pub excel: Option<PathBuf>,
    pub password: Option<String>,
    pub worksheet: Option<String>,
    pub json: Option<String>,
    pub yaml: Option<String>,
    pub ini: Option<String>,
    pub section: Option<String>,
    pub key_column: String,
    pub value_column: String,
}

/// 工作簿数据源（已校验）
#[derive(Debug, Clone)]
pub struct SpreadsheetSource {
    pub path: PathBuf,
    pub password: Option<String>,
    pub worksheet: String,
    pub extract: ExtractOptions,
}

/// 数据源（已校验，恰好一种）
#[derive(Debug, Clone)]
pub enum SourcePlan {
    Delimited(String),
    Spreadsheet(SpreadsheetSource),
}

/// 转换计划：校验后的不可变配置
#[derive(Debug, Clone)]
pub struct TransformPlan {
    pub source: SourcePlan,
    pub schema: Option<String>,
    pub category_column: String,
    pub default_category: String,
    pub filters: Vec<FieldFilter>,
    pub lookups: Vec<Lookup>,
}

impl WorkbookRequest {
    /// 解析请求文档（YAML 优先，其次 JSON）
    pub fn parse(text: &str) -> WorkbookResult<Self> {
        parse_structured(text)
    }

    /// 从文件读取请求文档，并加载 schema_file
    ///
    /// 请求中的相对路径（excel、查找表 excel、schema_file）按请求文件所在目录解析。
    pub fn from_file<P: AsRef<Path>>(path: P) -> WorkbookResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| WorkbookError::FileReadError(format!("{}: {}", path.display(), e)))?;
        let mut request = Self::parse(&text)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        if let Some(excel) = request.excel.as_mut() {
            excel.path = relative_to(base, &excel.path);
        }
        for lookup in request.lookups.iter_mut() {
            if let Some(excel) = lookup.excel.as_mut() {
                *excel = relative_to(base, excel);
            }
        }

        if non_empty(&request.schema).is_none() {
            if let Some(schema_file) = &request.schema_file {
                let schema_path = relative_to(base, schema_file);
                let schema = std::fs::read_to_string(&schema_path).map_err(|e| {
                    WorkbookError::FileReadError(format!("{}: {}", schema_path.display(), e))
                })?;
                request.schema = Some(schema);
            }
        }
        Ok(request)
    }

    /// 校验请求并生成转换计划
    pub fn validate(&self) -> WorkbookResult<TransformPlan> {
        let category_column =
            non_empty(&self.category_column).unwrap_or_else(|| DEFAULT_CATEGORY_COLUMN.to_string());
        let default_category = non_empty(&self.default_category).unwrap_or_default();

        let source = match (non_empty(&self.csv), &self.excel) {
            (Some(_), Some(_)) => return Err(WorkbookError::ConflictingSources),
            (None, None) => return Err(WorkbookError::MissingSource),
            (Some(text), None) => {
                if self.orientation == Orientation::Vertical {
                    return Err(WorkbookError::VerticalRequiresSpreadsheet);
                }
                SourcePlan::Delimited(text)
            }
            (None, Some(excel)) => {
                if self.orientation == Orientation::Vertical && default_category.is_empty() {
                    return Err(WorkbookError::VerticalRequiresCategory);
                }
                SourcePlan::Spreadsheet(SpreadsheetSource {
                    path: excel.path.clone(),
                    password: non_empty(&excel.password),
                    worksheet: excel.worksheet.clone(),
                    extract: ExtractOptions {
                        column_start: non_empty(&excel.col_start),
                        column_end: non_empty(&excel.col_end),
                        headers: excel.headers.clone(),
                        orientation: self.orientation,
                        category_column: category_column.clone(),
                        category_value: default_category.clone(),
                    },
                })
            }
        };

        let lookups = self
            .lookups
            .iter()
            .map(LookupSpec::validate)
            .collect::<WorkbookResult<Vec<_>>>()?;

        let filters = self
            .filters
            .iter()
            .map(|f| FieldFilter {
                name: f.name.clone(),
                values: f.values.clone(),
            })
            .collect();

        Ok(TransformPlan {
            source,
            schema: non_empty(&self.schema),
            category_column,
            default_category,
            filters,
            lookups,
        })
    }
}

impl LookupSpec {
    /// 校验数据源数量并转换为查找表定义
    pub fn validate(&self) -> WorkbookResult<Lookup> {
        let excel = self
            .excel
            .clone()
            .filter(|p| !p.as_os_str().is_empty());
        let worksheet = non_empty(&self.worksheet);
        let json = non_empty(&self.json);
        let yaml = non_empty(&self.yaml);
        let ini = non_empty(&self.ini);

        let is_worksheet = excel.is_some() || worksheet.is_some();
        let count = [is_worksheet, json.is_some(), yaml.is_some(), ini.is_some()]
            .iter()
            .filter(|present| **present)
            .count();

        let column = self.column.clone();
        if count > 1 {
            return Err(WorkbookError::MultipleLookupSources { column });
        }

        let source = if let Some(text) = json {
            LookupSource::Json(text)
        } else if let Some(text) = yaml {
            LookupSource::Yaml(text)
        } else if let Some(text) = ini {
            let section = non_empty(&self.section)
                .ok_or_else(|| WorkbookError::IniSectionRequired { column: column.clone() })?;
            LookupSource::Ini { text, section }
        } else if is_worksheet {
            LookupSource::Worksheet {
                excel,
                password: non_empty(&self.password),
                worksheet,
            }
        } else {
            return Err(WorkbookError::MissingLookupSource { column });
        };

        Ok(Lookup {
            column,
            source,
            key_column: self.key_column.clone(),
            value_column: self.value_column.clone(),
        })
    }
}

fn relative_to(base: &Path, path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() || path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// 空串视为未提供
fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
