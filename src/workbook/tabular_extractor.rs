// ==========================================
// 配置工作簿 - 表格提取器
// ==========================================
// 职责: 工作表 → 规整的矩形表格 → 分隔文本
// 方向: horizontal（一行一条记录）/ vertical（一行一个字段）
// ==========================================

use crate::config::DEFAULT_CATEGORY_COLUMN;
use crate::workbook::column::ColumnWindow;
use crate::workbook::error::{WorkbookError, WorkbookResult};
use crate::workbook::workbook_trait::SheetProvider;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// 表格方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// 每行一条记录，第 0 行为表头
    #[default]
    Horizontal,
    /// 每行一个字段，第一格为字段名，其余为各记录的值
    Vertical,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => write!(f, "horizontal"),
            Orientation::Vertical => write!(f, "vertical"),
        }
    }
}

/// 提取选项
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub column_start: Option<String>,
    pub column_end: Option<String>,
    /// 表头覆写（按窗口内位置）
    pub headers: Vec<String>,
    pub orientation: Orientation,
    /// 分类列名
    pub category_column: String,
    /// 注入分类列时填充的静态分类值
    pub category_value: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            column_start: None,
            column_end: None,
            headers: Vec::new(),
            orientation: Orientation::Horizontal,
            category_column: DEFAULT_CATEGORY_COLUMN.to_string(),
            category_value: String::new(),
        }
    }
}

/// 读取工作表并输出分隔文本（首行为表头）
pub fn extract_sheet(
    provider: &dyn SheetProvider,
    sheet: &str,
    options: &ExtractOptions,
) -> WorkbookResult<String> {
    let table = extract_table(provider, sheet, options)?;
    to_delimited_text(&table)
}

/// 读取工作表并输出矩形表格（首行为表头）
pub fn extract_table(
    provider: &dyn SheetProvider,
    sheet: &str,
    options: &ExtractOptions,
) -> WorkbookResult<Vec<Vec<String>>> {
    let rows = provider.read_rows(sheet)?;
    if rows.iter().all(|row| row.is_empty()) {
        return Err(WorkbookError::SheetEmpty(sheet.to_string()));
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let window = ColumnWindow::resolve(
        options.column_start.as_deref(),
        options.column_end.as_deref(),
        width,
    );

    let table = match options.orientation {
        Orientation::Horizontal => horizontal(&rows, window, options),
        Orientation::Vertical => vertical(&rows, window, options),
    };

    debug!(
        sheet = sheet,
        orientation = %options.orientation,
        window_start = window.start,
        window_end = window.end,
        rows = table.len(),
        "表格提取完成"
    );

    match table.len() {
        0 => Err(WorkbookError::SheetEmpty(sheet.to_string())),
        1 => Err(WorkbookError::SheetHeaderOnly(sheet.to_string())),
        _ => Ok(table),
    }
}

/// 矩形表格 → CSV 文本
pub fn to_delimited_text(table: &[Vec<String>]) -> WorkbookResult<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    for row in table {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| WorkbookError::CsvParseError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| WorkbookError::CsvParseError(e.to_string()))
}

// ==========================================
// horizontal: 行即记录
// ==========================================
fn horizontal(rows: &[Vec<String>], window: ColumnWindow, options: &ExtractOptions) -> Vec<Vec<String>> {
    let header_row = &rows[0];
    let headers: Vec<String> = window
        .indices()
        .enumerate()
        .map(|(pos, idx)| {
            options
                .headers
                .get(pos)
                .filter(|h| !h.trim().is_empty())
                .or_else(|| header_row.get(idx))
                .cloned()
                .unwrap_or_default()
        })
        .collect();

    // 注入列使用配置的分类列名（默认即 configuration_item），分组时才能找到它
    let inject = !has_category_column(&headers, &options.category_column);

    let mut table = Vec::with_capacity(rows.len());
    table.push(with_category(inject, &options.category_column, headers));

    for row in &rows[1..] {
        let cells: Vec<String> = window
            .indices()
            .map(|idx| row.get(idx).cloned().unwrap_or_default())
            .collect();
        if is_blank_row(&cells) {
            continue;
        }
        table.push(with_category(inject, &options.category_value, cells));
    }
    table
}

// ==========================================
// vertical: 行即字段，需要转置
// ==========================================
fn vertical(rows: &[Vec<String>], window: ColumnWindow, options: &ExtractOptions) -> Vec<Vec<String>> {
    let mut names = Vec::new();
    let mut columns: Vec<Vec<String>> = Vec::new();

    for row in rows {
        let mut cells = window
            .indices()
            .map(|idx| row.get(idx).cloned().unwrap_or_default());
        let name = cells.next().unwrap_or_default();
        if name.trim().is_empty() {
            continue;
        }
        let name = options
            .headers
            .get(names.len())
            .filter(|h| !h.trim().is_empty())
            .cloned()
            .unwrap_or(name);
        names.push(name);
        columns.push(cells.collect());
    }

    if names.is_empty() {
        return Vec::new();
    }

    let record_count = columns.iter().map(Vec::len).max().unwrap_or(0);
    // 同上：注入列名跟随配置的分类列名
    let inject = !has_category_column(&names, &options.category_column);

    let mut table = Vec::with_capacity(record_count + 1);
    table.push(with_category(inject, &options.category_column, names));

    for record_idx in 0..record_count {
        let cells: Vec<String> = columns
            .iter()
            .map(|column| column.get(record_idx).cloned().unwrap_or_default())
            .collect();
        if is_blank_row(&cells) {
            continue;
        }
        table.push(with_category(inject, &options.category_value, cells));
    }
    table
}

fn has_category_column(headers: &[String], category_column: &str) -> bool {
    headers
        .iter()
        .any(|h| h == DEFAULT_CATEGORY_COLUMN || h == category_column)
}

fn with_category(inject: bool, leading: &str, cells: Vec<String>) -> Vec<String> {
    if !inject {
        return cells;
    }
    let mut row = Vec::with_capacity(cells.len() + 1);
    row.push(leading.to_string());
    row.extend(cells);
    row
}

/// 去除空白、逗号、括号、引号后为空的行视为空行
fn is_blank_row(cells: &[String]) -> bool {
    cells.iter().all(|cell| {
        cell.chars().all(|ch| {
            ch.is_whitespace() || matches!(ch, ',' | '[' | ']' | '(' | ')' | '{' | '}' | '"' | '\'')
        })
    })
}
