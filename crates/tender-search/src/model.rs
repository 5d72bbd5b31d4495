use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Product category families for power cables.
///
/// The serialized form (snake_case) is what feed documents and catalog files use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryTag {
    /// Low-tension power cables (up to 1.1 kV).
    LtPowerCable,
    /// High-tension power cables (above 1.1 kV, below 66 kV).
    HtPowerCable,
    /// Extra-high-voltage power cables (66 kV and above).
    EhvPowerCable,
    /// Multicore control cables.
    ControlCable,
    /// Aerial bunched cables for overhead distribution.
    AerialBunchedCable,
}

impl CategoryTag {
    pub fn display_name(&self) -> &'static str {
        match self {
            CategoryTag::LtPowerCable => "LT Power Cable",
            CategoryTag::HtPowerCable => "HT Power Cable",
            CategoryTag::EhvPowerCable => "EHV Power Cable",
            CategoryTag::ControlCable => "Control Cable",
            CategoryTag::AerialBunchedCable => "Aerial Bunched Cable",
        }
    }

    /// Tag in the serialized (snake_case) form, for logs and API payloads.
    pub fn tag(&self) -> &'static str {
        match self {
            CategoryTag::LtPowerCable => "lt_power_cable",
            CategoryTag::HtPowerCable => "ht_power_cable",
            CategoryTag::EhvPowerCable => "ehv_power_cable",
            CategoryTag::ControlCable => "control_cable",
            CategoryTag::AerialBunchedCable => "aerial_bunched_cable",
        }
    }

    pub fn parse_tag(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lt_power_cable" => Some(CategoryTag::LtPowerCable),
            "ht_power_cable" => Some(CategoryTag::HtPowerCable),
            "ehv_power_cable" => Some(CategoryTag::EhvPowerCable),
            "control_cable" => Some(CategoryTag::ControlCable),
            "aerial_bunched_cable" => Some(CategoryTag::AerialBunchedCable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConductorMaterial {
    Copper,
    Aluminium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Insulation {
    Xlpe,
    Pvc,
    Epr,
}

/// Structured search intent extracted from free text. Ephemeral: created per
/// query, threaded explicitly through each pipeline stage, discarded after the
/// response is built.
#[derive(Debug, Clone, Default)]
pub struct SearchIntent {
    /// Detected product categories. Never "null": absent detection is an empty set.
    pub categories: BTreeSet<CategoryTag>,
    /// Detected voltages in kV, in detection order.
    pub voltages_kv: Vec<f64>,
    pub core_count: Option<u32>,
    pub cross_section_sqmm: Option<f64>,
    pub conductor_material: Option<ConductorMaterial>,
    pub insulation: Option<Insulation>,
    pub armoured: Option<bool>,
    pub city: Option<String>,
    /// Portal/feed identifier, e.g. "gem". Restricts which feeds are probed.
    pub portal: Option<String>,
    pub organisation: Option<String>,
}

/// One concrete (category, voltage, city) search probe. Immutable once generated;
/// carries no identity beyond its field tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPermutation {
    pub category: CategoryTag,
    pub voltage_kv: Option<f64>,
    pub city: Option<String>,
    /// Human-readable label, a pure function of the three fields above.
    /// Used for provenance display.
    pub composed_keyword: String,
}

/// One requirement line inside a tender record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementLine {
    pub category: Option<CategoryTag>,
    pub voltage_kv: Option<f64>,
    pub core_count: Option<u32>,
    pub cross_section_sqmm: Option<f64>,
    pub conductor_material: Option<ConductorMaterial>,
    pub insulation: Option<Insulation>,
    pub armoured: Option<bool>,
    /// Quantity in kilometres.
    pub quantity_km: Option<f64>,
}

/// One procurement opportunity, owned by an external data feed (read-only here).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenderRecord {
    /// Unique within a feed; the merge key across feeds.
    pub tender_id: String,
    pub title: String,
    pub organisation: String,
    pub city: String,
    /// ISO date, YYYY-MM-DD (lexicographic order is chronological).
    pub due_date: String,
    pub estimated_cost: Option<f64>,
    #[serde(default)]
    pub requirements: Vec<RequirementLine>,
}

/// How confidently a permutation matched a tender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    /// Matched against a structured requirement line (authoritative).
    Structured,
    /// Matched only against free-text fields (title).
    TextFallback,
}

/// A tender that passed the feed filter for at least one permutation.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub tender: TenderRecord,
    pub source_feed: String,
    /// Every distinct signal that fired, in firing order.
    pub matched_keywords: Vec<String>,
    /// The permutations whose filters produced this candidate.
    pub filters_applied: Vec<SearchPermutation>,
    pub confidence: MatchConfidence,
}

/// A `MatchCandidate` annotated by the scorer. Created once per surviving
/// candidate, consumed immediately by deduplication.
#[derive(Debug, Clone)]
pub struct ScoredMatch {
    pub candidate: MatchCandidate,
    pub spec_match_percent: u8,
    pub can_bid: bool,
}

/// Final deduplicated view: one per unique tender id, holding the
/// highest-scoring occurrence plus the union of all keywords that led to it.
#[derive(Debug, Clone)]
pub struct RankedResult {
    pub tender: TenderRecord,
    pub source_feed: String,
    pub spec_match_percent: u8,
    pub can_bid: bool,
    pub matched_keywords: Vec<String>,
}
