// ==========================================
// 配置工作簿 - 记录规整器
// ==========================================
// 职责: 分隔文本 → 原始记录（首行为表头）
// 约束: 纯函数，相同文本得到相同顺序的记录
// ==========================================

use crate::workbook::error::{WorkbookError, WorkbookResult};
use csv::ReaderBuilder;

/// 原始记录：列名 → 原始单元格值（保留表头列顺序）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// 按列名取值（重复列名取第一个）
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// 解析分隔文本为原始记录
///
/// # 返回
/// - Ok(Vec<RawRecord>): 每个数据行一条，字段数与表头一致
/// - Err(CsvParseError): 引号未闭合 / 字段数不一致
pub fn normalize_records(text: &str) -> WorkbookResult<Vec<RawRecord>> {
    check_quotes(text)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let fields = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        records.push(RawRecord::new(fields));
    }

    Ok(records)
}

/// 检查引号是否闭合
///
/// csv 读取器遇到未闭合的引号会把剩余文本全部读入同一字段，这里提前报错。
/// 只有字段开头的引号开启引用字段；引用字段内 `""` 为转义引号。
fn check_quotes(text: &str) -> WorkbookResult<()> {
    let mut chars = text.chars().peekable();
    let mut line = 1;
    let mut opened_at = 0;
    let mut field_start = true;
    let mut quoted = false;

    while let Some(ch) = chars.next() {
        if ch == '\n' {
            line += 1;
        }
        if quoted {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    quoted = false;
                }
            }
            continue;
        }
        match ch {
            '"' if field_start => {
                quoted = true;
                opened_at = line;
                field_start = false;
            }
            ',' | '\n' | '\r' => field_start = true,
            _ => field_start = false,
        }
    }

    if quoted {
        return Err(WorkbookError::CsvParseError(format!(
            "第 {} 行的引号未闭合",
            opened_at
        )));
    }
    Ok(())
}
