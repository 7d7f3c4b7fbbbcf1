// ==========================================
// 配置工作簿 - 错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 输入校验 / 解析 / 资源解析
// ==========================================

use thiserror::Error;

/// 工作簿转换错误类型
///
/// 所有错误对本次调用都是终止性的，错误信息原样返回给调用方。
/// 查找表未命中不是错误（见 lookup 模块）。
#[derive(Error, Debug)]
pub enum WorkbookError {
    // ===== 输入校验错误 =====
    #[error("csv 与 excel 不能同时使用")]
    ConflictingSources,

    #[error("必须提供 csv 或 excel 数据源之一")]
    MissingSource,

    #[error("vertical 方向仅支持 excel 数据源")]
    VerticalRequiresSpreadsheet,

    #[error("vertical 方向必须提供 configuration_item（默认分类值）")]
    VerticalRequiresCategory,

    #[error("查找表 {column}: 只能配置一种数据源 (worksheet/json/yaml/ini)")]
    MultipleLookupSources { column: String },

    #[error("查找表 {column}: 未配置数据源 (worksheet/json/yaml/ini)")]
    MissingLookupSource { column: String },

    #[error("查找表 {column}: 使用 ini 作为数据源时必须提供 section")]
    IniSectionRequired { column: String },

    // ===== 解析错误 =====
    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("无法使用 yaml 或 json 解析文本: {0}")]
    DocumentParseError(String),

    #[error("Excel 打开失败 ({path}): {message}")]
    WorkbookOpenError { path: String, message: String },

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("序列化失败: {0}")]
    SerializeError(String),

    // ===== 资源解析错误 =====
    #[error("工作表不存在: {0}")]
    SheetNotFound(String),

    #[error("工作表没有任何行: {0}")]
    SheetEmpty(String),

    #[error("工作表只有表头，没有数据行: {0}")]
    SheetHeaderOnly(String),
}

impl From<std::io::Error> for WorkbookError {
    fn from(err: std::io::Error) -> Self {
        WorkbookError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for WorkbookError {
    fn from(err: csv::Error) -> Self {
        WorkbookError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for WorkbookError {
    fn from(err: calamine::Error) -> Self {
        WorkbookError::ExcelParseError(err.to_string())
    }
}

impl From<serde_json::Error> for WorkbookError {
    fn from(err: serde_json::Error) -> Self {
        WorkbookError::SerializeError(err.to_string())
    }
}

/// Result 类型别名
pub type WorkbookResult<T> = Result<T, WorkbookError>;
