// ==========================================
// 配置工作簿 - INI 解析
// ==========================================
// 用途: INI 查找表数据源 / INI → JSON 转换
// 规则: [section] 开启新节；key = value 归入当前节；
//       节之前的键值归入 default 节；; 与 # 开头为注释
// ==========================================

use crate::workbook::error::WorkbookResult;
use std::collections::BTreeMap;

/// 节名 → 键 → 值
pub type IniSections = BTreeMap<String, BTreeMap<String, String>>;

pub const DEFAULT_SECTION: &str = "default";

pub fn parse_ini(text: &str) -> IniSections {
    let mut sections = IniSections::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            if !name.is_empty() {
                sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
            }
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                continue;
            }
            let section = current.get_or_insert_with(|| DEFAULT_SECTION.to_string());
            sections
                .entry(section.clone())
                .or_default()
                .insert(key.to_string(), value.to_string());
        }
    }

    sections
}

/// INI 文本 → JSON 文本
///
/// 指定 section 时只输出该节（不存在则为空对象），否则输出全部节。
pub fn ini_to_json(text: &str, section: Option<&str>) -> WorkbookResult<String> {
    let sections = parse_ini(text);
    let json = match section.filter(|s| !s.is_empty()) {
        Some(name) => serde_json::to_string(&sections.get(name).cloned().unwrap_or_default())?,
        None => serde_json::to_string(&sections)?,
    };
    Ok(json)
}
