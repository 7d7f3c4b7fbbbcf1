// ==========================================
// 配置工作簿 - 核心库
// ==========================================
// 职责: 表格数据（CSV / Excel）按映射文档转换为类型化分组文档
// 技术栈: calamine + csv + serde（JSON/YAML）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 配置层 - 转换请求与校验
pub mod config;

// 转换层 - 提取/规整/映射/分组
pub mod workbook;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::{TransformPlan, WorkbookRequest, DEFAULT_CATEGORY_COLUMN};

pub use workbook::{
    ini_to_json, render, Document, FieldType, FieldValue, OutputFormat, OutputRecord,
    WorkbookEngine, WorkbookError, WorkbookResult,
};

// ==========================================
// 常量定义
// ==========================================

// 版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
