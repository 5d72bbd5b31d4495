/// Multi-feed search executor.
///
/// Applies every permutation to every feed's records. Matching policy:
/// - A city constraint on the permutation is a hard filter: records in a
///   different city are excluded outright, with no scoring leniency.
/// - Category/voltage constraints are matched against the tender's structured
///   requirement lines, which are authoritative; only records with no
///   requirement lines at all fall back to the free-text title, at lower
///   confidence.
/// - OR semantics across lines and permutations: a tender is included once per
///   feed if any permutation matches, and `matched_keywords` accumulates every
///   distinct signal that fired.
///
/// If the full query yields zero results, the executor re-runs with the city
/// constraint dropped — city is the most restrictive, least load-bearing
/// constraint. The category constraint is never relaxed: it defines the nature
/// of the opportunity. The caller can therefore distinguish "no results at
/// all" from "no results in the requested city".
use tracing::{debug, info};

use crate::feeds::FeedSnapshot;
use crate::model::{
    CategoryTag, MatchCandidate, MatchConfidence, RequirementLine, SearchPermutation, TenderRecord,
};
use crate::permute::{compose_keyword, format_kv};

pub struct ExecutorOutcome {
    pub candidates: Vec<MatchCandidate>,
    /// True when the first pass found nothing and the city constraint was
    /// dropped for a second pass.
    pub city_relaxed: bool,
}

pub fn execute(
    feeds: &[FeedSnapshot],
    permutations: &[SearchPermutation],
    organisation: Option<&str>,
) -> ExecutorOutcome {
    let candidates = run_probes(feeds, permutations, organisation);
    if !candidates.is_empty() {
        return ExecutorOutcome {
            candidates,
            city_relaxed: false,
        };
    }

    let had_city = permutations.iter().any(|p| p.city.is_some());
    if !had_city {
        return ExecutorOutcome {
            candidates,
            city_relaxed: false,
        };
    }

    // Relaxation pass: same probes, city constraint dropped.
    info!("zero results under full constraints, relaxing city filter");
    let relaxed: Vec<SearchPermutation> = permutations
        .iter()
        .map(|p| SearchPermutation {
            category: p.category,
            voltage_kv: p.voltage_kv,
            city: None,
            composed_keyword: compose_keyword(p.category, p.voltage_kv, None),
        })
        .collect();
    let candidates = run_probes(feeds, &relaxed, organisation);
    ExecutorOutcome {
        candidates,
        city_relaxed: true,
    }
}

fn run_probes(
    feeds: &[FeedSnapshot],
    permutations: &[SearchPermutation],
    organisation: Option<&str>,
) -> Vec<MatchCandidate> {
    let mut candidates = Vec::new();
    for feed in feeds {
        let mut feed_matches = 0usize;
        for record in &feed.records {
            if let Some(org) = organisation {
                if !record.organisation.to_lowercase().contains(&org.to_lowercase()) {
                    continue;
                }
            }
            if let Some(candidate) = probe_record(record, &feed.id, permutations) {
                feed_matches += 1;
                candidates.push(candidate);
            }
        }
        debug!(feed = %feed.id, matches = feed_matches, "feed probed");
    }
    candidates
}

/// Evaluate one record against every permutation, accumulating provenance.
fn probe_record(
    record: &TenderRecord,
    feed_id: &str,
    permutations: &[SearchPermutation],
) -> Option<MatchCandidate> {
    let mut matched_keywords: Vec<String> = Vec::new();
    let mut filters_applied: Vec<SearchPermutation> = Vec::new();
    let mut confidence = MatchConfidence::TextFallback;

    for permutation in permutations {
        // Hard city filter.
        if let Some(city) = &permutation.city {
            if !record.city.eq_ignore_ascii_case(city) {
                continue;
            }
        }

        let structured = record
            .requirements
            .iter()
            .any(|line| line_matches(line, permutation));
        // Structured lines are authoritative: the title is only consulted for
        // records that carry no requirement lines at all. A record whose lines
        // describe a different product must not surface on a title token.
        let matched =
            structured || (record.requirements.is_empty() && title_matches(&record.title, permutation));
        if !matched {
            continue;
        }

        if structured {
            confidence = MatchConfidence::Structured;
            push_distinct(&mut matched_keywords, permutation.composed_keyword.clone());
        } else {
            push_distinct(
                &mut matched_keywords,
                format!("{} (title)", permutation.composed_keyword),
            );
        }
        filters_applied.push(permutation.clone());
    }

    if filters_applied.is_empty() {
        return None;
    }
    Some(MatchCandidate {
        tender: record.clone(),
        source_feed: feed_id.to_string(),
        matched_keywords,
        filters_applied,
        confidence,
    })
}

/// Structured match: the requirement line confirms the probe's category, or
/// its declared voltage sits in the probe's voltage class.
fn line_matches(line: &RequirementLine, permutation: &SearchPermutation) -> bool {
    if line.category == Some(permutation.category) {
        return true;
    }
    matches!(
        (line.voltage_kv, permutation.voltage_kv),
        (Some(a), Some(b)) if (a - b).abs() < 1e-6
    )
}

/// Free-text fallback: category synonym or voltage token in the title.
fn title_matches(title: &str, permutation: &SearchPermutation) -> bool {
    let title = title.to_lowercase();
    if let Some(v) = permutation.voltage_kv {
        let token = format_kv(v).to_lowercase();
        let spaced = token.replace("kv", " kv");
        if title.contains(&token) || title.contains(&spaced) {
            return true;
        }
    }
    category_tokens(permutation.category)
        .iter()
        .any(|t| title.contains(t))
}

fn category_tokens(category: CategoryTag) -> &'static [&'static str] {
    match category {
        CategoryTag::LtPowerCable => &["lt cable", "lt power", "low tension"],
        CategoryTag::HtPowerCable => &["ht cable", "ht power", "ht xlpe", "high tension"],
        CategoryTag::EhvPowerCable => &["ehv", "extra high voltage"],
        CategoryTag::ControlCable => &["control cable"],
        CategoryTag::AerialBunchedCable => &["aerial bunched", "ab cable", "abc cable"],
    }
}

fn push_distinct(keywords: &mut Vec<String>, keyword: String) {
    if !keywords.contains(&keyword) {
        keywords.push(keyword);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogIndex;
    use crate::extract::extract_intent;
    use crate::permute::generate_permutations;

    fn ht_requirement(voltage_kv: f64) -> RequirementLine {
        RequirementLine {
            category: Some(CategoryTag::HtPowerCable),
            voltage_kv: Some(voltage_kv),
            core_count: Some(3),
            cross_section_sqmm: Some(95.0),
            conductor_material: None,
            insulation: None,
            armoured: None,
            quantity_km: Some(10.0),
        }
    }

    fn tender(id: &str, title: &str, city: &str, requirements: Vec<RequirementLine>) -> TenderRecord {
        TenderRecord {
            tender_id: id.to_string(),
            title: title.to_string(),
            organisation: "State Power Distribution Ltd".to_string(),
            city: city.to_string(),
            due_date: "2026-09-15".to_string(),
            estimated_cost: Some(1_000_000.0),
            requirements,
        }
    }

    fn feed(id: &str, records: Vec<TenderRecord>) -> FeedSnapshot {
        FeedSnapshot {
            id: id.to_string(),
            records,
        }
    }

    fn probes_for(query: &str) -> Vec<SearchPermutation> {
        generate_permutations(&extract_intent(query), &CatalogIndex::builtin())
    }

    #[test]
    fn city_is_a_hard_filter() {
        // Scenario A: Mumbai tender matches; Delhi tender is excluded outright.
        let feeds = vec![feed(
            "gem",
            vec![
                tender("T-MUM", "Supply of 11KV HT Cable", "Mumbai", vec![ht_requirement(11.0)]),
                tender("T-DEL", "Supply of 11KV HT Cable", "Delhi", vec![ht_requirement(11.0)]),
            ],
        )];
        let outcome = execute(&feeds, &probes_for("11kV HT cable in Mumbai"), None);

        assert!(!outcome.city_relaxed);
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].tender.tender_id, "T-MUM");
        assert_eq!(outcome.candidates[0].confidence, MatchConfidence::Structured);
    }

    #[test]
    fn relaxation_drops_city_after_zero_results() {
        // Scenario B: nothing in Mumbai, but Delhi has a match.
        let feeds = vec![feed(
            "gem",
            vec![tender("T-DEL", "Supply of 11KV HT Cable", "Delhi", vec![ht_requirement(11.0)])],
        )];
        let outcome = execute(&feeds, &probes_for("11kV HT cable in Mumbai"), None);

        assert!(outcome.city_relaxed);
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].tender.tender_id, "T-DEL");
    }

    #[test]
    fn category_is_never_relaxed() {
        // A control-cable tender must not surface for an HT query even after
        // the city relaxation pass.
        let control_line = RequirementLine {
            category: Some(CategoryTag::ControlCable),
            voltage_kv: Some(1.1),
            core_count: Some(12),
            cross_section_sqmm: Some(2.5),
            conductor_material: None,
            insulation: None,
            armoured: None,
            quantity_km: None,
        };
        let feeds = vec![feed(
            "gem",
            vec![tender("T-CTL", "Supply of Control Cable", "Delhi", vec![control_line])],
        )];
        let outcome = execute(&feeds, &probes_for("11kV HT cable in Mumbai"), None);

        assert!(outcome.city_relaxed);
        assert!(outcome.candidates.is_empty());
    }

    #[test]
    fn title_token_cannot_override_authoritative_requirements() {
        // The requirement line declares a control cable; "11kv" in the title
        // must not surface it for an HT query.
        let control_line = RequirementLine {
            category: Some(CategoryTag::ControlCable),
            voltage_kv: Some(1.1),
            core_count: Some(12),
            cross_section_sqmm: Some(2.5),
            conductor_material: None,
            insulation: None,
            armoured: None,
            quantity_km: None,
        };
        let feeds = vec![feed(
            "gem",
            vec![tender(
                "T-SUB",
                "Control cable package for 11kv substation",
                "Mumbai",
                vec![control_line],
            )],
        )];
        let outcome = execute(&feeds, &probes_for("11kv ht cable"), None);

        assert!(outcome.candidates.is_empty());
    }

    #[test]
    fn title_fallback_fires_when_requirements_are_absent() {
        let feeds = vec![feed(
            "eprocure",
            vec![tender("T-TXT", "Procurement of 11kV HT XLPE cable drums", "Mumbai", vec![])],
        )];
        let outcome = execute(&feeds, &probes_for("11kV HT cable in Mumbai"), None);

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].confidence, MatchConfidence::TextFallback);
        assert!(outcome.candidates[0].matched_keywords[0].ends_with("(title)"));
    }

    #[test]
    fn keywords_accumulate_across_permutations() {
        // A tender requiring both 11kV and 33kV lines fires on both probes.
        let feeds = vec![feed(
            "gem",
            vec![tender(
                "T-2",
                "HT cable package",
                "Pune",
                vec![ht_requirement(11.0), ht_requirement(33.0)],
            )],
        )];
        let outcome = execute(&feeds, &probes_for("HT cable 11kv and 33kv"), None);

        assert_eq!(outcome.candidates.len(), 1);
        let keywords = &outcome.candidates[0].matched_keywords;
        assert!(keywords.iter().any(|k| k.contains("11kV")));
        assert!(keywords.iter().any(|k| k.contains("33kV")));
        assert!(outcome.candidates[0].filters_applied.len() >= 2);
    }

    #[test]
    fn record_included_once_per_feed() {
        let record = tender("T-3", "11KV HT Cable", "Mumbai", vec![ht_requirement(11.0)]);
        let feeds = vec![
            feed("gem", vec![record.clone()]),
            feed("eprocure", vec![record]),
        ];
        let outcome = execute(&feeds, &probes_for("11kv ht cable"), None);
        // One candidate per feed; deduplication across feeds happens downstream.
        assert_eq!(outcome.candidates.len(), 2);
    }

    #[test]
    fn organisation_filter_is_hard() {
        let feeds = vec![feed(
            "gem",
            vec![tender("T-4", "11KV HT Cable", "Mumbai", vec![ht_requirement(11.0)])],
        )];
        let probes = probes_for("11kv ht cable");

        let hit = execute(&feeds, &probes, Some("State Power"));
        assert_eq!(hit.candidates.len(), 1);

        let miss = execute(&feeds, &probes, Some("Railway Corp"));
        assert!(miss.candidates.is_empty());
    }
}
