// ==========================================
// 配置工作簿 - 配置层
// ==========================================
// 职责: 转换请求的解析、默认值与校验
// 输出: TransformPlan（引擎唯一输入）
// ==========================================

pub mod request;

/// 未配置分类列时使用的列名
pub const DEFAULT_CATEGORY_COLUMN: &str = "configuration_item";

pub use request::{
    ExcelSourceSpec, FilterSpec, LookupSpec, SourcePlan, SpreadsheetSource, TransformPlan,
    WorkbookRequest,
};
