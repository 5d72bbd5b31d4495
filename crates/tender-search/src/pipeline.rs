/// Pipeline orchestration: parse -> generate -> search -> score -> rank.
///
/// Stateless per query: each run allocates its own intent, permutations and
/// result structures, so concurrent queries never contend. The only shared
/// resources are the catalog index (immutable after startup) and the cache.
/// Every stage appends to the process log so the calling UI can show what the
/// pipeline actually did.
use std::sync::Arc;

use tracing::info;

use crate::cache::TenderCache;
use crate::catalog::CatalogIndex;
use crate::executor;
use crate::extract::extract_intent;
use crate::feeds::FeedRegistry;
use crate::model::{CategoryTag, RankedResult, ScoredMatch, SearchIntent};
use crate::permute::{format_kv, generate_permutations};
use crate::rank::dedupe_and_rank;
use crate::score::{apply_intent_overlay, score_tender};
use tender_common::api::{RankedTender, SearchSummary, StageLog, TenderSearchResponse};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

/// Caller-supplied overrides. A set field bypasses extraction for that field.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub category: Option<CategoryTag>,
    pub voltage_kv: Option<f64>,
    pub city: Option<String>,
}

pub struct Pipeline {
    catalog: Arc<CatalogIndex>,
    registry: FeedRegistry,
    cache: Arc<TenderCache>,
}

impl Pipeline {
    pub fn new(catalog: Arc<CatalogIndex>, registry: FeedRegistry, cache: Arc<TenderCache>) -> Self {
        Self {
            catalog,
            registry,
            cache,
        }
    }

    pub fn catalog(&self) -> &CatalogIndex {
        &self.catalog
    }

    pub fn registry(&self) -> &FeedRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &TenderCache {
        &self.cache
    }

    /// Run the full discovery pipeline for one query.
    pub async fn run(&self, query: &str, overrides: &Overrides, limit: usize) -> TenderSearchResponse {
        let limit = limit.clamp(1, MAX_LIMIT);
        let cache_key = cache_key(query, overrides);
        if let Some(cached) = self.cache.get_search(&cache_key, limit).await {
            info!(query, "search cache hit");
            return cached;
        }

        let mut log: Vec<StageLog> = Vec::new();

        // 1. Parse
        let intent = build_intent(query, overrides);
        log.push(stage(
            "parse",
            format!(
                "detected categories [{}], voltages [{}], city {}",
                join_tags(&intent),
                join_voltages(&intent),
                intent.city.as_deref().unwrap_or("-"),
            ),
        ));

        if intent.categories.is_empty() {
            // Scenario: nothing recognizable. Do not scan feeds; tell the user
            // the query itself needs refinement.
            info!(query, "no category detected, short-circuiting");
            return TenderSearchResponse {
                summary: summary_for(&intent, "no_category_detected",
                    Some("No product category recognized in the query. Mention a cable family (HT/LT/EHV/control) or a voltage class like 11kV.".to_string()),
                    0, 0, Vec::new(), 0, 0, false),
                results: Vec::new(),
                process_log: log,
            };
        }

        // 2. Generate
        let permutations = generate_permutations(&intent, &self.catalog);
        log.push(stage(
            "generate",
            format!("{} search permutations", permutations.len()),
        ));

        // 3. Search (feed loads run concurrently; probes are independent)
        let (snapshots, feeds_failed) = self
            .registry
            .load_all(&self.cache, intent.portal.as_deref())
            .await;
        let outcome = executor::execute(&snapshots, &permutations, intent.organisation.as_deref());
        log.push(stage(
            "search",
            format!(
                "{} candidates across {} feeds{}{}",
                outcome.candidates.len(),
                snapshots.len(),
                if feeds_failed.is_empty() {
                    String::new()
                } else {
                    format!(" ({} failed)", feeds_failed.len())
                },
                if outcome.city_relaxed { ", city constraint relaxed" } else { "" },
            ),
        ));

        // 4. Score
        let scored: Vec<ScoredMatch> = outcome
            .candidates
            .into_iter()
            .map(|candidate| {
                let items = self.candidate_items(&candidate.filters_applied, &intent);
                let score = score_tender(&candidate.tender, &items);
                ScoredMatch {
                    candidate,
                    spec_match_percent: score.percent,
                    can_bid: score.can_bid,
                }
            })
            .collect();
        let bid_eligible = scored.iter().filter(|m| m.can_bid).count();
        log.push(stage(
            "score",
            format!("{} matches scored, {} bid-eligible", scored.len(), bid_eligible),
        ));

        // 5. Rank
        let ranked = dedupe_and_rank(scored);
        let matching_count = ranked.len();
        let bid_eligible = ranked.iter().filter(|r| r.can_bid).count();
        log.push(stage(
            "rank",
            format!("{matching_count} unique tenders after deduplication"),
        ));

        let (outcome_label, message) = if matching_count == 0 {
            let detail = if outcome.city_relaxed {
                format!(
                    "No matching tenders found across {} feeds, even after dropping the city constraint.",
                    snapshots.len()
                )
            } else {
                format!("No matching tenders found across {} feeds.", snapshots.len())
            };
            ("no_results", Some(detail))
        } else if outcome.city_relaxed {
            (
                "ok",
                Some(format!(
                    "No matches in {}; the city constraint was dropped.",
                    intent.city.as_deref().unwrap_or("the requested city")
                )),
            )
        } else {
            ("ok", None)
        };

        let response = TenderSearchResponse {
            summary: summary_for(
                &intent,
                outcome_label,
                message,
                permutations.len(),
                snapshots.len(),
                feeds_failed,
                matching_count,
                bid_eligible,
                outcome.city_relaxed,
            ),
            results: ranked.into_iter().take(limit).map(to_api_result).collect(),
            process_log: log,
        };

        self.cache.set_search(&cache_key, limit, &response).await;
        response
    }

    /// Candidate catalog items for scoring: the items of every category the
    /// candidate matched through, with the user's declared spec overlaid.
    fn candidate_items(
        &self,
        filters: &[crate::model::SearchPermutation],
        intent: &SearchIntent,
    ) -> Vec<crate::catalog::CatalogItem> {
        let mut categories: Vec<CategoryTag> = Vec::new();
        for f in filters {
            if !categories.contains(&f.category) {
                categories.push(f.category);
            }
        }
        categories
            .iter()
            .flat_map(|&c| self.catalog.items_for(c))
            .map(|item| apply_intent_overlay(item, intent))
            .collect()
    }
}

fn build_intent(query: &str, overrides: &Overrides) -> SearchIntent {
    let mut intent = extract_intent(query);
    if let Some(category) = overrides.category {
        intent.categories.clear();
        intent.categories.insert(category);
    }
    if let Some(v) = overrides.voltage_kv {
        intent.voltages_kv = vec![v];
    }
    if let Some(city) = &overrides.city {
        intent.city = Some(city.clone());
    }
    // An override voltage without any category still gets band inference.
    if intent.categories.is_empty() && !intent.voltages_kv.is_empty() {
        for &v in &intent.voltages_kv.clone() {
            intent.categories.insert(crate::catalog::category_for_voltage(v));
        }
    }
    intent
}

fn cache_key(query: &str, overrides: &Overrides) -> String {
    format!(
        "{}|{}|{}|{}",
        query.trim().to_lowercase(),
        overrides.category.map(|c| c.tag()).unwrap_or("-"),
        overrides.voltage_kv.map(format_kv).unwrap_or_else(|| "-".to_string()),
        overrides.city.as_deref().unwrap_or("-"),
    )
}

fn stage(name: &str, detail: String) -> StageLog {
    StageLog {
        stage: name.to_string(),
        detail,
    }
}

fn join_tags(intent: &SearchIntent) -> String {
    intent
        .categories
        .iter()
        .map(|c| c.tag())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_voltages(intent: &SearchIntent) -> String {
    intent
        .voltages_kv
        .iter()
        .map(|&v| format_kv(v))
        .collect::<Vec<_>>()
        .join(", ")
}

#[allow(clippy::too_many_arguments)]
fn summary_for(
    intent: &SearchIntent,
    outcome: &str,
    message: Option<String>,
    permutation_count: usize,
    feeds_searched: usize,
    feeds_failed: Vec<String>,
    matching_count: usize,
    bid_eligible_count: usize,
    city_relaxed: bool,
) -> SearchSummary {
    SearchSummary {
        outcome: outcome.to_string(),
        message,
        categories: intent.categories.iter().map(|c| c.tag().to_string()).collect(),
        voltages_kv: intent.voltages_kv.clone(),
        city: intent.city.clone(),
        permutation_count,
        feeds_searched,
        feeds_failed,
        matching_count,
        bid_eligible_count,
        city_relaxed,
    }
}

fn to_api_result(r: RankedResult) -> RankedTender {
    RankedTender {
        tender_id: r.tender.tender_id,
        title: r.tender.title,
        organisation: r.tender.organisation,
        city: r.tender.city,
        due_date: r.tender.due_date,
        estimated_cost: r.tender.estimated_cost,
        source_feed: r.source_feed,
        spec_match_percent: r.spec_match_percent,
        can_bid: r.can_bid,
        matched_keywords: r.matched_keywords,
    }
}
