/// Deduplication and ranking.
///
/// The same tender is often reachable through several feeds and permutations.
/// Results are merged by tender id, keeping the highest-scoring occurrence
/// (ties broken by earlier due date) and the union of every keyword that led
/// to it. The final order is due date ascending, then score descending:
/// deadline pressure dominates, so an urgent lower-scoring opportunity
/// surfaces before a distant higher-scoring one. The sort is stable, so
/// entries with identical keys keep their input order.
use std::collections::HashMap;

use crate::model::{RankedResult, ScoredMatch};

pub fn dedupe_and_rank(matches: Vec<ScoredMatch>) -> Vec<RankedResult> {
    let mut results: Vec<RankedResult> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for m in matches {
        match by_id.get(&m.candidate.tender.tender_id) {
            Some(&idx) => {
                let existing = &mut results[idx];
                for keyword in &m.candidate.matched_keywords {
                    if !existing.matched_keywords.contains(keyword) {
                        existing.matched_keywords.push(keyword.clone());
                    }
                }
                if beats(&m, existing) {
                    existing.tender = m.candidate.tender;
                    existing.source_feed = m.candidate.source_feed;
                    existing.spec_match_percent = m.spec_match_percent;
                    existing.can_bid = m.can_bid;
                }
            }
            None => {
                by_id.insert(m.candidate.tender.tender_id.clone(), results.len());
                results.push(RankedResult {
                    tender: m.candidate.tender,
                    source_feed: m.candidate.source_feed,
                    spec_match_percent: m.spec_match_percent,
                    can_bid: m.can_bid,
                    matched_keywords: m.candidate.matched_keywords,
                });
            }
        }
    }

    // Stable sort: due date ascending (ISO dates order lexicographically),
    // spec match percent descending.
    results.sort_by(|a, b| {
        a.tender
            .due_date
            .cmp(&b.tender.due_date)
            .then(b.spec_match_percent.cmp(&a.spec_match_percent))
    });
    results
}

/// Within a duplicate group, a higher score wins; on equal scores the earlier
/// due date wins.
fn beats(challenger: &ScoredMatch, incumbent: &RankedResult) -> bool {
    if challenger.spec_match_percent != incumbent.spec_match_percent {
        return challenger.spec_match_percent > incumbent.spec_match_percent;
    }
    challenger.candidate.tender.due_date < incumbent.tender.due_date
}
