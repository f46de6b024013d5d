// ==========================================
// 核电机组状态时序系统 - 日报表格抽取
// ==========================================
// 职责: HTML 日报 → 六字段原始行
// 版式: 六列（机组/功率/停堆日期/原因/变更标记/紧急停堆次数）优先，
//       全文无六列行时回落到两列（机组/功率），缺失字段补空
// 约束: 其他列数的行静默丢弃；空结果表示当日无数据（不是错误）
// ==========================================

use crate::domain::reactor::RawStatusRow;
use crate::domain::types::TableLayout;
use once_cell::sync::Lazy;
use regex::Regex;

static TABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<table\b([^>]*)>(.*?)</table\s*>").expect("table regex"));
static POWER_CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bclass\s*=\s*(?:"[^"]*\bpower\b[^"]*"|'[^']*\bpower\b[^']*'|power\b)"#)
        .expect("class regex")
});
static TR_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<tr\b[^>]*>").expect("tr regex"));
static TD_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<td\b[^>]*>").expect("td regex"));
static TD_CLOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</td\s*>").expect("td close regex"));
static TR_CLOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</tr\s*>").expect("tr close regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex"));
static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("entity regex"));

// ==========================================
// TableExtraction - 抽取结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct TableExtraction {
    layout: Option<TableLayout>,
    tables_found: usize,
    cell_rows: Vec<Vec<String>>, // 全部表格的数据行（已去表头）
}

impl TableExtraction {
    /// 命中的版式；None 表示无可用行
    pub fn layout(&self) -> Option<TableLayout> {
        self.layout
    }

    pub fn tables_found(&self) -> usize {
        self.tables_found
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_none()
    }

    /// 合格行（惰性转换为 RawStatusRow）
    pub fn rows(&self) -> impl Iterator<Item = RawStatusRow> + '_ {
        let wanted = self.layout.map(|l| l.column_count());
        self.cell_rows
            .iter()
            .filter(move |cells| Some(cells.len()) == wanted)
            .map(|cells| to_raw_row(cells))
    }
}

fn to_raw_row(cells: &[String]) -> RawStatusRow {
    match cells {
        [unit, power] => RawStatusRow::from_two(unit.clone(), power.clone()),
        [a, b, c, d, e, f] => RawStatusRow::from_six([
            a.clone(),
            b.clone(),
            c.clone(),
            d.clone(),
            e.clone(),
            f.clone(),
        ]),
        // rows() 只放行 2 / 6 列
        _ => RawStatusRow::from_two(cells.first().cloned().unwrap_or_default(), String::new()),
    }
}

// ==========================================
// TableExtractor
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct TableExtractor;

impl TableExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 解析一份日报
    ///
    /// 表格选择: 优先 class 含 "power" 的表格；文档中没有这类表格时考虑全部表格
    pub fn extract(&self, html: &str) -> TableExtraction {
        let all_tables: Vec<(&str, &str)> = TABLE_RE
            .captures_iter(html)
            .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
            .collect();

        let power_tables: Vec<&str> = all_tables
            .iter()
            .filter(|(attrs, _)| POWER_CLASS_RE.is_match(attrs))
            .map(|(_, body)| *body)
            .collect();

        let tables: Vec<&str> = if power_tables.is_empty() {
            all_tables.iter().map(|(_, body)| *body).collect()
        } else {
            power_tables
        };

        let cell_rows: Vec<Vec<String>> = tables
            .iter()
            .flat_map(|body| split_rows(body).into_iter().skip(1)) // 首行为表头
            .map(split_cells)
            .collect();

        let layout = [TableLayout::SixField, TableLayout::TwoField]
            .into_iter()
            .find(|layout| cell_rows.iter().any(|c| c.len() == layout.column_count()));

        TableExtraction {
            layout,
            tables_found: tables.len(),
            cell_rows,
        }
    }
}

/// 按 <tr> 起始标签切分行（容忍缺失 </tr>）
fn split_rows(table_body: &str) -> Vec<&str> {
    let starts: Vec<(usize, usize)> = TR_OPEN_RE
        .find_iter(table_body)
        .map(|m| (m.start(), m.end()))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &(_, content_start))| {
            let end = starts.get(i + 1).map(|&(s, _)| s).unwrap_or(table_body.len());
            let segment = &table_body[content_start..end];
            match TR_CLOSE_RE.find(segment) {
                Some(close) => &segment[..close.start()],
                None => segment,
            }
        })
        .collect()
}

/// 按 <td> 起始标签切分单元格（容忍缺失 </td>；<th> 不计入）
fn split_cells(row: &str) -> Vec<String> {
    let starts: Vec<(usize, usize)> = TD_OPEN_RE
        .find_iter(row)
        .map(|m| (m.start(), m.end()))
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &(_, content_start))| {
            let end = starts.get(i + 1).map(|&(s, _)| s).unwrap_or(row.len());
            let segment = &row[content_start..end];
            let segment = match TD_CLOSE_RE.find(segment) {
                Some(close) => &segment[..close.start()],
                None => segment,
            };
            cell_text(segment)
        })
        .collect()
}

/// 单元格纯文本: 去标签 → 实体解码 → 空白折叠
pub fn cell_text(fragment: &str) -> String {
    let stripped = TAG_RE.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity.to_ascii_lowercase().as_str() {
                    "nbsp" => Some(' '),
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    _ => None,
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
