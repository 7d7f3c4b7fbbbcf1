// ==========================================
// 配置工作簿 - 转换层
// ==========================================
// 职责: 表格数据（CSV / Excel 工作表）→ 类型化分组文档
// 阶段: 提取 → 规整 → 映射解析 → 重映射 → 分组
// ==========================================

pub mod aggregator;
pub mod column;
pub mod engine;
pub mod error;
pub mod field_remapper;
pub mod ini;
pub mod lookup;
pub mod record_normalizer;
pub mod schema;
pub mod sheet_reader;
pub mod tabular_extractor;
pub mod value;
pub mod workbook_trait;

// 重导出核心类型
pub use aggregator::{aggregate, render, Document, OutputFormat};
pub use engine::WorkbookEngine;
pub use error::{WorkbookError, WorkbookResult};
pub use field_remapper::{FieldFilter, FieldRemapper};
pub use ini::{ini_to_json, parse_ini};
pub use lookup::{Lookup, LookupResolver, LookupSource};
pub use record_normalizer::{normalize_records, RawRecord};
pub use schema::{resolve_schema, FieldSpec, SchemaMapping};
pub use sheet_reader::{ExcelWorkbook, InMemoryWorkbook};
pub use tabular_extractor::{extract_sheet, ExtractOptions, Orientation};
pub use value::{coerce, FieldType, FieldValue, OutputRecord};
pub use workbook_trait::{RecordMapper, SheetProvider};
