// ==========================================
// 配置工作簿 - 列字母换算
// ==========================================
// 规则: A=0, Z=25, AA=26, AZ=51 ...（双射 26 进制，大小写不敏感）
// ==========================================

/// 列字母 → 0 基列号
///
/// 非法输入（空串、含非字母字符）返回 None。
pub fn column_index(letters: &str) -> Option<usize> {
    let letters = letters.trim();
    if letters.is_empty() {
        return None;
    }

    let mut index: usize = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

/// 列窗口（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnWindow {
    pub start: usize,
    pub end: usize,
}

impl ColumnWindow {
    /// 根据起止列字母构造窗口
    ///
    /// # 参数
    /// - start: 起始列字母（缺省或无法识别 → 第一列）
    /// - end: 结束列字母（缺省或无法识别 → 最后一列）
    /// - width: 表格总宽度
    pub fn resolve(start: Option<&str>, end: Option<&str>, width: usize) -> Self {
        let last = width.saturating_sub(1);
        let start = start.and_then(column_index).unwrap_or(0);
        let end = end.and_then(column_index).unwrap_or(last).min(last);
        Self { start, end }
    }

    /// 窗口内的列号（窗口反向时为空）
    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_index_single_and_double_letters() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("Z"), Some(25));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("AZ"), Some(51));
        assert_eq!(column_index("ba"), Some(52));
    }

    #[test]
    fn test_column_index_invalid() {
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn test_window_defaults_to_full_width() {
        let window = ColumnWindow::resolve(None, None, 4);
        assert_eq!(window, ColumnWindow { start: 0, end: 3 });

        let window = ColumnWindow::resolve(Some("??"), Some("B"), 4);
        assert_eq!(window, ColumnWindow { start: 0, end: 1 });
    }

    #[test]
    fn test_window_end_clamped_to_width() {
        let window = ColumnWindow::resolve(Some("B"), Some("AZ"), 3);
        assert_eq!(window, ColumnWindow { start: 1, end: 2 });
        assert_eq!(window.indices().collect::<Vec<_>>(), vec![1, 2]);
    }
}
