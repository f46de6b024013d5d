// ==========================================
// 核电机组状态时序系统 - 机组名称归一化
// ==========================================
// 职责: 原始机组名 → 规范名（≤30 字符）
// 流程: 空白折叠 + 首字母大写 → 子串替换表 → 整串特例表 → 截断
// 约束: 确定性、幂等（规范名再次归一化保持不变）
// ==========================================

use crate::domain::reactor::UNIT_NAME_MAX_LEN;
use tracing::warn;

/// 子串替换规则（按声明顺序依次应用）
pub const SUBSTRING_RULES: &[(&str, &str)] = &[
    ("D.c. Cook", "D.C. Cook"),
    ("Fitzpatrick", "FitzPatrick"),
    ("Lasalle", "LaSalle"),
    ("Mcguire", "McGuire"),
    ("Cook 1", "D.C. Cook 1"),
    ("Cook 2", "D.C. Cook 2"),
    ("Davis Besse", "Davis-Besse"),
    ("St. Lucie", "Saint Lucie"),
    ("Columbia Generating", "Columbia Generating Station"),
    ("River Bend 1", "River Bend Station 1"),
];

/// 整串特例（首个命中即止）
pub const SPECIAL_CASE_RULES: &[(&str, &str)] = &[
    ("FitzPatrick 1", "FitzPatrick"),
    ("Three Mile Island", "Three Mile Island 1"),
    ("Clinton 1", "Clinton"),
    ("Cooper 1", "Cooper"),
    ("Monticello 1", "Monticello"),
    ("Summer 1", "Summer"),
    ("Callaway 1", "Callaway"),
];

// ==========================================
// NormalizedName - 归一化结果
// ==========================================
/// 截断后再归一化的轮数上限
const MAX_TRUNCATION_PASSES: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub name: String,
    pub truncated: bool, // 超长截断（数据质量告警）
}

#[derive(Debug, Clone, Default)]
pub struct UnitNormalizer;

impl UnitNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// 归一化一个原始机组名
    ///
    /// 截断可能切断规则替换后的词（如 "McGu"），截断结果继续归一化直到不再变化
    pub fn normalize(&self, raw: &str) -> NormalizedName {
        let full = self.canonical(raw);
        if full.chars().count() <= UNIT_NAME_MAX_LEN {
            return NormalizedName {
                name: full,
                truncated: false,
            };
        }

        let mut name = truncate(&full);
        for _ in 0..MAX_TRUNCATION_PASSES {
            let next = self.canonical(&name);
            let next = if next.chars().count() > UNIT_NAME_MAX_LEN {
                truncate(&next)
            } else {
                next
            };
            if next == name {
                break;
            }
            name = next;
        }
        warn!(raw = %raw, original = %full, truncated = %name, "机组名超长，已截断");

        NormalizedName {
            name,
            truncated: true,
        }
    }

    /// 空白折叠 + 首字母大写 + 替换规则（不截断）
    fn canonical(&self, raw: &str) -> String {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut name = title_case(&collapsed);

        for (from, to) in SUBSTRING_RULES {
            name = replace_unexpanded(&name, from, to);
        }

        if let Some((_, to)) = SPECIAL_CASE_RULES.iter().find(|(from, _)| *from == name) {
            name = (*to).to_string();
        }
        name
    }
}

fn truncate(name: &str) -> String {
    let cut: String = name.chars().take(UNIT_NAME_MAX_LEN).collect();
    cut.trim_end().to_string()
}

/// 逐词首字母大写: 紧跟非字母字符的字母大写，其余字母小写
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_cased = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_cased = true;
        } else {
            out.push(c);
            prev_cased = false;
        }
    }
    out
}

/// 子串替换，跳过已处于展开形式中的命中
///
/// 若 `to` 本身包含 `from`（如 "Cook 1" → "D.C. Cook 1"），
/// 命中位置所在的完整 `to` 不再展开
fn replace_unexpanded(text: &str, from: &str, to: &str) -> String {
    let offset_in_to = to.find(from);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for (pos, _) in text.match_indices(from) {
        if pos < cursor {
            continue;
        }
        let already_expanded = offset_in_to
            .and_then(|k| pos.checked_sub(k))
            .map(|start| text[start..].starts_with(to))
            .unwrap_or(false);

        out.push_str(&text[cursor..pos]);
        if already_expanded {
            out.push_str(from);
        } else {
            out.push_str(to);
        }
        cursor = pos + from.len();
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> String {
        UnitNormalizer::new().normalize(raw).name
    }

    #[test]
    fn test_title_case_follows_letter_boundaries() {
        assert_eq!(title_case("BEAVER VALLEY 1"), "Beaver Valley 1");
        assert_eq!(title_case("d.c. cook 2"), "D.C. Cook 2");
        assert_eq!(title_case("davis-besse"), "Davis-Besse");
    }

    #[test]
    fn test_substring_rules() {
        assert_eq!(norm("  LaSalle   1 "), "LaSalle 1");
        assert_eq!(norm("MCGUIRE 2"), "McGuire 2");
        assert_eq!(norm("Cook 1"), "D.C. Cook 1");
        assert_eq!(norm("Davis Besse"), "Davis-Besse");
        assert_eq!(norm("St. Lucie 2"), "Saint Lucie 2");
        assert_eq!(norm("Columbia Generating"), "Columbia Generating Station");
        assert_eq!(norm("River Bend 1"), "River Bend Station 1");
    }

    #[test]
    fn test_special_cases_after_substrings() {
        assert_eq!(norm("FITZPATRICK 1"), "FitzPatrick");
        assert_eq!(norm("Three Mile Island"), "Three Mile Island 1");
        assert_eq!(norm("Clinton 1"), "Clinton");
        assert_eq!(norm("Callaway 1"), "Callaway");
        // 特例只匹配整串
        assert_eq!(norm("Summer 12"), "Summer 12");
    }

    #[test]
    fn test_idempotent_on_canonical_names() {
        let canonical = [
            "D.C. Cook 1",
            "D.C. Cook 2",
            "Columbia Generating Station",
            "River Bend Station 1",
            "FitzPatrick",
            "Three Mile Island 1",
            "Davis-Besse",
            "McGuire 1",
            "LaSalle 2",
            "Saint Lucie 1",
        ];
        for name in canonical {
            assert_eq!(norm(name), name, "{name} 再次归一化应保持不变");
        }
    }

    #[test]
    fn test_truncates_to_budget() {
        let result = UnitNormalizer::new()
            .normalize("Some Extraordinarily Long Plant Name Unit 3");
        assert!(result.truncated);
        assert!(result.name.chars().count() <= UNIT_NAME_MAX_LEN);
        assert!(!result.name.ends_with(' '));
        assert_eq!(norm(&result.name), result.name);
    }

    #[test]
    fn test_truncation_through_rule_target_is_stable() {
        let normalizer = UnitNormalizer::new();
        for (from, _) in SUBSTRING_RULES {
            for pad in 10..UNIT_NAME_MAX_LEN {
                let raw = format!("{} {} 1", "a".repeat(pad), from.to_uppercase());
                let once = normalizer.normalize(&raw);
                let twice = normalizer.normalize(&once.name);
                assert_eq!(twice.name, once.name, "截断后不幂等: {raw:?}");
                assert!(once.name.chars().count() <= UNIT_NAME_MAX_LEN);
            }
        }

        assert_eq!(
            norm("aaaaaaaaaaaaaaaaaaaaaaaaa mcguire 1"),
            "Aaaaaaaaaaaaaaaaaaaaaaaaa Mcgu"
        );
    }

    #[test]
    fn test_deterministic() {
        let a = norm("palo verde   3");
        let b = norm("palo verde   3");
        assert_eq!(a, b);
        assert_eq!(a, "Palo Verde 3");
    }
}
