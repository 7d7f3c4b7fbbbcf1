// ==========================================
// 配置工作簿 - 工作表读取器实现
// ==========================================
// 支持: Excel (.xlsx/.xlsm/.xls/.xlsb/.ods) 与内存表格
// 约束: 工作簿句柄只在单次 read_rows 调用内存活
// ==========================================

use crate::workbook::error::{WorkbookError, WorkbookResult};
use crate::workbook::workbook_trait::SheetProvider;
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

// ==========================================
// Excel 工作簿（calamine）
// ==========================================
#[derive(Debug, Clone)]
pub struct ExcelWorkbook {
    path: PathBuf,
    password: Option<String>,
}

impl ExcelWorkbook {
    pub fn new<P: AsRef<Path>>(path: P, password: Option<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            password,
        }
    }

    fn open(&self) -> WorkbookResult<Sheets<std::io::BufReader<std::fs::File>>> {
        if !self.path.exists() {
            return Err(WorkbookError::WorkbookOpenError {
                path: self.path.display().to_string(),
                message: "文件不存在".to_string(),
            });
        }

        open_workbook_auto(&self.path).map_err(|e| {
            // calamine 不支持解密，带密码的工作簿在此处失败
            let message = match &self.password {
                Some(_) => format!("{} (工作簿可能已加密，无法使用提供的密码解密)", e),
                None => e.to_string(),
            };
            WorkbookError::WorkbookOpenError {
                path: self.path.display().to_string(),
                message,
            }
        })
    }
}

impl SheetProvider for ExcelWorkbook {
    fn read_rows(&self, sheet: &str) -> WorkbookResult<Vec<Vec<String>>> {
        let mut workbook = self.open()?;

        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        if !sheet_names.iter().any(|name| name == sheet) {
            return Err(WorkbookError::SheetNotFound(sheet.to_string()));
        }

        let range = workbook.worksheet_range(sheet)?;

        // calamine 的 Range 从第一个非空单元格开始，需要重新锚定到 A1
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows: Vec<Vec<String>> = vec![Vec::new(); row_offset];
        for data_row in range.rows() {
            let mut cells = vec![String::new(); col_offset];
            cells.extend(data_row.iter().map(cell_to_string));
            rows.push(cells);
        }

        debug!(
            path = %self.path.display(),
            sheet = sheet,
            rows = rows.len(),
            "工作表读取完成"
        );
        Ok(rows)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ==========================================
// 内存工作簿
// ==========================================
/// 以 工作表名 → 行列表 保存的内存工作簿
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkbook {
    sheets: HashMap<String, Vec<Vec<String>>>,
}

impl InMemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加工作表（同名覆盖）
    pub fn with_sheet<S, R, C>(mut self, name: S, rows: R) -> Self
    where
        S: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| cell.into()).collect())
            .collect();
        self.sheets.insert(name.into(), rows);
        self
    }
}

impl SheetProvider for InMemoryWorkbook {
    fn read_rows(&self, sheet: &str) -> WorkbookResult<Vec<Vec<String>>> {
        self.sheets
            .get(sheet)
            .cloned()
            .ok_or_else(|| WorkbookError::SheetNotFound(sheet.to_string()))
    }

    fn describe(&self) -> String {
        format!("<memory:{} sheets>", self.sheets.len())
    }
}
