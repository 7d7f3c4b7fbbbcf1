// ==========================================
// 配置工作簿 - 组件 Trait
// ==========================================
// 职责: 定义工作表读取与单条记录映射接口（不包含实现）
// 实现者: ExcelWorkbook（calamine）, InMemoryWorkbook（内存表格）, FieldRemapper
// ==========================================

use crate::workbook::error::WorkbookResult;
use crate::workbook::record_normalizer::RawRecord;
use crate::workbook::value::OutputRecord;

// ==========================================
// SheetProvider Trait
// ==========================================
// 用途: 按工作表名读取单元格网格（阶段 0）
pub trait SheetProvider: Send + Sync {
    /// 读取工作表的全部行
    ///
    /// # 参数
    /// - sheet: 工作表名
    ///
    /// # 返回
    /// - Ok(Vec<Vec<String>>): 行列表，第 0 行对应电子表格第 1 行，第 0 列对应 A 列
    /// - Err: 工作簿打开失败 / 工作表不存在
    fn read_rows(&self, sheet: &str) -> WorkbookResult<Vec<Vec<String>>>;

    /// 数据源描述（用于日志）
    fn describe(&self) -> String;
}

// ==========================================
// RecordMapper Trait
// ==========================================
// 用途: 单条记录重映射（阶段 2）
pub trait RecordMapper {
    /// 将原始记录映射为输出记录
    ///
    /// # 参数
    /// - record: 原始记录
    /// - row_number: 行号（1 基，用于日志）
    ///
    /// # 返回
    /// - Some(OutputRecord): 通过过滤的输出记录
    /// - None: 记录被过滤掉
    fn map_record(&self, record: &RawRecord, row_number: usize) -> Option<OutputRecord>;
}
