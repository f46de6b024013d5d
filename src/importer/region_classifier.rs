// ==========================================
// 核电机组状态时序系统 - 监管区域分类
// ==========================================
// 职责: 规范机组名 → 监管区域
// 规则: 电站名大小写不敏感子串包含，按表声明顺序首个命中即止
// 兜底: 无命中时返回 Region::I 并标记为 Fallback（离线复核）
// ==========================================

use crate::domain::types::Region;

/// 电站 → 区域表（声明顺序即匹配优先级）
pub const PLANT_REGIONS: &[(&str, Region)] = &[
    ("Beaver Valley", Region::I),
    ("Calvert Cliffs", Region::I),
    ("FitzPatrick", Region::I),
    ("Ginna", Region::I),
    ("Hope Creek", Region::I),
    ("Limerick", Region::I),
    ("Millstone", Region::I),
    ("Nine Mile Point", Region::I),
    ("Peach Bottom", Region::I),
    ("Salem", Region::I),
    ("Seabrook", Region::I),
    ("Susquehanna", Region::I),
    ("Browns Ferry", Region::II),
    ("Brunswick", Region::II),
    ("Catawba", Region::II),
    ("Farley", Region::II),
    ("Harris", Region::II),
    ("Hatch", Region::II),
    ("McGuire", Region::II),
    ("North Anna", Region::II),
    ("Oconee", Region::II),
    ("Robinson", Region::II),
    ("Saint Lucie", Region::II),
    ("Sequoyah", Region::II),
    ("Summer", Region::II),
    ("Surry", Region::II),
    ("Turkey Point", Region::II),
    ("Vogtle", Region::II),
    ("Watts Bar", Region::II),
    ("Braidwood", Region::III),
    ("Byron", Region::III),
    ("Clinton", Region::III),
    ("D.C. Cook", Region::III),
    ("Davis-Besse", Region::III),
    ("Dresden", Region::III),
    ("Fermi", Region::III),
    ("LaSalle", Region::III),
    ("Monticello", Region::III),
    ("Perry", Region::III),
    ("Point Beach", Region::III),
    ("Prairie Island", Region::III),
    ("Quad Cities", Region::III),
    ("Arkansas Nuclear", Region::IV),
    ("Callaway", Region::IV),
    ("Columbia Generating Station", Region::IV),
    ("Comanche Peak", Region::IV),
    ("Cooper", Region::IV),
    ("Diablo Canyon", Region::IV),
    ("Grand Gulf", Region::IV),
    ("Palo Verde", Region::IV),
    ("River Bend Station", Region::IV),
    ("South Texas", Region::IV),
    ("Waterford", Region::IV),
    ("Wolf Creek", Region::IV),
];

// ==========================================
// RegionMatch - 分类结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionMatch {
    Matched { region: Region, plant: &'static str },
    Fallback(Region), // 未识别电站，使用默认区域
}

impl RegionMatch {
    pub fn region(&self) -> Region {
        match self {
            RegionMatch::Matched { region, .. } => *region,
            RegionMatch::Fallback(region) => *region,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RegionMatch::Fallback(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegionClassifier;

impl RegionClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, unit_name: &str) -> RegionMatch {
        let haystack = unit_name.to_lowercase();
        PLANT_REGIONS
            .iter()
            .find(|(plant, _)| haystack.contains(&plant.to_lowercase()))
            .map(|(plant, region)| RegionMatch::Matched {
                region: *region,
                plant: *plant,
            })
            .unwrap_or(RegionMatch::Fallback(Region::default()))
    }
}
