use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FindTendersParams {
    /// Natural-language query describing what to look for, e.g.
    /// "11kV HT cable tenders in Mumbai".
    pub query: String,
    /// Explicit category tag (e.g. "ht_power_cable"). Bypasses category detection.
    pub category: Option<String>,
    /// Explicit voltage in kV. Bypasses voltage detection.
    pub voltage_kv: Option<f64>,
    /// Explicit city filter. Bypasses city detection.
    pub city: Option<String>,
    /// Maximum number of ranked results to return (default: 20, max: 100).
    pub limit: Option<u32>,
}

/// One side of a specification comparison. Any field absent on either side is
/// excluded from the match score entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SpecAttributes {
    pub voltage_kv: Option<f64>,
    pub core_count: Option<u32>,
    pub cross_section_sqmm: Option<f64>,
    /// "copper" or "aluminium"
    pub conductor_material: Option<String>,
    /// Insulation type, e.g. "xlpe" or "pvc"
    pub insulation: Option<String>,
    pub armoured: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MatchSpecificationParams {
    /// The tender's declared requirement.
    pub requirement: SpecAttributes,
    /// The candidate catalog item to compare against.
    pub catalog_item: SpecAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MatchSpecificationResponse {
    /// Normalized match percentage in [0, 100].
    pub spec_match_percent: u8,
    /// True when the score clears the bid-eligibility threshold.
    pub can_bid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StageLog {
    /// Pipeline stage name: parse, generate, search, score, rank.
    pub stage: String,
    /// Human-readable description with salient counts.
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchSummary {
    /// Overall outcome: "ok", "no_category_detected", "no_results".
    pub outcome: String,
    /// User-actionable message for non-ok outcomes, or a note that a
    /// constraint was relaxed.
    pub message: Option<String>,
    pub categories: Vec<String>,
    pub voltages_kv: Vec<f64>,
    pub city: Option<String>,
    pub permutation_count: usize,
    pub feeds_searched: usize,
    pub feeds_failed: Vec<String>,
    pub matching_count: usize,
    pub bid_eligible_count: usize,
    /// True when the city constraint was dropped after a zero-result first pass.
    pub city_relaxed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RankedTender {
    pub tender_id: String,
    pub title: String,
    pub organisation: String,
    pub city: String,
    /// ISO date, YYYY-MM-DD.
    pub due_date: String,
    pub estimated_cost: Option<f64>,
    pub source_feed: String,
    pub spec_match_percent: u8,
    pub can_bid: bool,
    /// Every distinct keyword/city signal that surfaced this tender,
    /// across all feeds and permutations.
    pub matched_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TenderSearchResponse {
    pub summary: SearchSummary,
    pub results: Vec<RankedTender>,
    pub process_log: Vec<StageLog>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FeedInfo {
    pub id: String,
    pub available: bool,
    pub record_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListFeedsResponse {
    pub feeds: Vec<FeedInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RefreshFeedsResponse {
    /// True when the cached feed snapshots and search results were cleared.
    /// False when no cache is connected (feeds are re-read on every search anyway).
    pub cache_invalidated: bool,
    pub feeds: Vec<FeedInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CatalogCategoryInfo {
    pub category: String,
    pub display_name: String,
    pub voltages_kv: Vec<f64>,
    pub core_counts: Vec<u32>,
    pub cross_sections_sqmm: Vec<f64>,
    pub item_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListCatalogResponse {
    pub categories: Vec<CatalogCategoryInfo>,
}
