/// Specification match scorer.
///
/// Compares a tender's declared requirement against a candidate catalog item
/// using per-attribute checks. Exact-match attributes (conductor material,
/// insulation, armoured) earn full weight only on equality; tolerance-banded
/// attributes (voltage, core count, cross-section) earn graded partial credit
/// inside the band, so near-identical specifications (94.5 vs 95 sqmm) score
/// near-full instead of zero. Attributes absent from either side are excluded
/// from both numerator and denominator.
///
/// The tolerance thresholds and the bid cutoff were carried over from the
/// incumbent evaluation rules. Flagged for domain-expert review; do not retune
/// without one.
use crate::catalog::CatalogItem;
use crate::model::{RequirementLine, SearchIntent, TenderRecord};

/// Relative tolerance band for voltage class proximity.
pub const VOLTAGE_TOLERANCE: f64 = 0.25;
/// Relative tolerance band for conductor cross-section proximity.
pub const CROSS_SECTION_TOLERANCE: f64 = 0.30;
/// Absolute tolerance band for core count proximity.
pub const CORE_COUNT_TOLERANCE: u32 = 2;
/// Minimum normalized score for a bid-eligible match.
pub const BID_THRESHOLD_PERCENT: u8 = 50;

const WEIGHT_VOLTAGE: f64 = 30.0;
const WEIGHT_CROSS_SECTION: f64 = 25.0;
const WEIGHT_CORE_COUNT: f64 = 20.0;
const WEIGHT_MATERIAL: f64 = 15.0;
const WEIGHT_INSULATION: f64 = 5.0;
const WEIGHT_ARMOURED: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecScore {
    /// Normalized match percentage in [0, 100].
    pub percent: u8,
    pub can_bid: bool,
}

impl SpecScore {
    fn from_points(earned: f64, possible: f64) -> Self {
        if possible <= 0.0 {
            // No attribute present on both sides: nothing to compare.
            return SpecScore { percent: 0, can_bid: false };
        }
        let percent = ((earned / possible) * 100.0).round().clamp(0.0, 100.0) as u8;
        SpecScore {
            percent,
            can_bid: percent >= BID_THRESHOLD_PERCENT,
        }
    }
}

/// Score one requirement line against one catalog item. Symmetric: swapping
/// the sides yields the same score.
pub fn score_requirement(requirement: &RequirementLine, item: &CatalogItem) -> SpecScore {
    let mut earned = 0.0;
    let mut possible = 0.0;

    if let (Some(a), Some(b)) = (requirement.voltage_kv, item.voltage_kv) {
        possible += WEIGHT_VOLTAGE;
        earned += WEIGHT_VOLTAGE * banded_credit(a, b, VOLTAGE_TOLERANCE);
    }
    if let (Some(a), Some(b)) = (requirement.cross_section_sqmm, item.cross_section_sqmm) {
        possible += WEIGHT_CROSS_SECTION;
        earned += WEIGHT_CROSS_SECTION * banded_credit(a, b, CROSS_SECTION_TOLERANCE);
    }
    if let (Some(a), Some(b)) = (requirement.core_count, item.core_count) {
        possible += WEIGHT_CORE_COUNT;
        earned += WEIGHT_CORE_COUNT * core_count_credit(a, b);
    }
    if let (Some(a), Some(b)) = (requirement.conductor_material, item.conductor_material) {
        possible += WEIGHT_MATERIAL;
        if a == b {
            earned += WEIGHT_MATERIAL;
        }
    }
    if let (Some(a), Some(b)) = (requirement.insulation, item.insulation) {
        possible += WEIGHT_INSULATION;
        if a == b {
            earned += WEIGHT_INSULATION;
        }
    }
    if let (Some(a), Some(b)) = (requirement.armoured, item.armoured) {
        possible += WEIGHT_ARMOURED;
        if a == b {
            earned += WEIGHT_ARMOURED;
        }
    }

    SpecScore::from_points(earned, possible)
}

/// Score a whole tender against the vendor's catalog: the best score across
/// every (requirement line, catalog item) pair wins.
pub fn score_tender(tender: &TenderRecord, items: &[CatalogItem]) -> SpecScore {
    let mut best = SpecScore { percent: 0, can_bid: false };
    for line in &tender.requirements {
        for item in items {
            let score = score_requirement(line, item);
            if score.percent > best.percent {
                best = score;
            }
        }
    }
    best
}

/// Overlay the user's declared spec constraints onto a catalog item, so an
/// explicit "3 core 95 sqmm copper" in the query refines the candidate side
/// of the comparison.
pub fn apply_intent_overlay(item: &CatalogItem, intent: &SearchIntent) -> CatalogItem {
    CatalogItem {
        voltage_kv: item.voltage_kv,
        core_count: intent.core_count.or(item.core_count),
        cross_section_sqmm: intent.cross_section_sqmm.or(item.cross_section_sqmm),
        conductor_material: intent.conductor_material.or(item.conductor_material),
        insulation: intent.insulation.or(item.insulation),
        armoured: intent.armoured.or(item.armoured),
    }
}

/// Graded credit for a continuous attribute: 1.0 on equality, falling linearly
/// to 0.0 at the edge of the relative tolerance band.
fn banded_credit(a: f64, b: f64, tolerance: f64) -> f64 {
    let base = a.abs().max(b.abs());
    if base == 0.0 {
        return 1.0;
    }
    let relative = (a - b).abs() / base;
    if relative >= tolerance {
        0.0
    } else {
        1.0 - relative / tolerance
    }
}

fn core_count_credit(a: u32, b: u32) -> f64 {
    let diff = a.abs_diff(b);
    if diff > CORE_COUNT_TOLERANCE {
        0.0
    } else {
        1.0 - diff as f64 / (CORE_COUNT_TOLERANCE + 1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConductorMaterial, Insulation};

    fn requirement(
        voltage_kv: Option<f64>,
        core_count: Option<u32>,
        cross_section_sqmm: Option<f64>,
    ) -> RequirementLine {
        RequirementLine {
            category: None,
            voltage_kv,
            core_count,
            cross_section_sqmm,
            conductor_material: None,
            insulation: None,
            armoured: None,
            quantity_km: None,
        }
    }

    fn item(
        voltage_kv: Option<f64>,
        core_count: Option<u32>,
        cross_section_sqmm: Option<f64>,
    ) -> CatalogItem {
        CatalogItem {
            voltage_kv,
            core_count,
            cross_section_sqmm,
            ..CatalogItem::default()
        }
    }

    #[test]
    fn identical_specs_score_one_hundred() {
        let req = RequirementLine {
            category: None,
            voltage_kv: Some(11.0),
            core_count: Some(3),
            cross_section_sqmm: Some(95.0),
            conductor_material: Some(ConductorMaterial::Aluminium),
            insulation: Some(Insulation::Xlpe),
            armoured: Some(true),
            quantity_km: None,
        };
        let item = CatalogItem {
            voltage_kv: Some(11.0),
            core_count: Some(3),
            cross_section_sqmm: Some(95.0),
            conductor_material: Some(ConductorMaterial::Aluminium),
            insulation: Some(Insulation::Xlpe),
            armoured: Some(true),
        };
        let score = score_requirement(&req, &item);
        assert_eq!(score.percent, 100);
        assert!(score.can_bid);
    }

    #[test]
    fn near_identical_cross_section_gets_near_full_credit() {
        // 96 vs 95 sqmm is ~1% relative difference; must not score zero.
        let score = score_requirement(&requirement(None, None, Some(96.0)), &item(None, None, Some(95.0)));
        assert!(score.percent >= 95, "expected near-full credit, got {}", score.percent);
    }

    #[test]
    fn cross_section_outside_band_scores_zero() {
        // 240 vs 95 sqmm is far outside the 30% band.
        let score = score_requirement(&requirement(None, None, Some(240.0)), &item(None, None, Some(95.0)));
        assert_eq!(score.percent, 0);
        assert!(!score.can_bid);
    }

    #[test]
    fn core_count_within_two_gets_partial_credit() {
        let exact = score_requirement(&requirement(None, Some(3), None), &item(None, Some(3), None));
        let near = score_requirement(&requirement(None, Some(3), None), &item(None, Some(4), None));
        let far = score_requirement(&requirement(None, Some(3), None), &item(None, Some(6), None));
        assert_eq!(exact.percent, 100);
        assert!(near.percent > 0 && near.percent < 100);
        assert_eq!(far.percent, 0);
    }

    #[test]
    fn material_mismatch_earns_zero_for_that_attribute() {
        let req = RequirementLine {
            conductor_material: Some(ConductorMaterial::Copper),
            ..requirement(Some(11.0), None, None)
        };
        let item = CatalogItem {
            conductor_material: Some(ConductorMaterial::Aluminium),
            voltage_kv: Some(11.0),
            ..CatalogItem::default()
        };
        // voltage (30) full + material (15) zero out of 45 -> 67%
        let score = score_requirement(&req, &item);
        assert_eq!(score.percent, 67);
    }

    #[test]
    fn absent_attributes_do_not_hurt_the_score() {
        // Only voltage present on both sides; everything else absent.
        let score = score_requirement(&requirement(Some(11.0), None, None), &item(Some(11.0), Some(3), Some(95.0)));
        assert_eq!(score.percent, 100);
    }

    #[test]
    fn nothing_comparable_scores_zero_without_bid() {
        let score = score_requirement(&requirement(None, None, None), &item(Some(11.0), None, None));
        assert_eq!(score.percent, 0);
        assert!(!score.can_bid);
    }

    #[test]
    fn scoring_is_symmetric() {
        let a = score_requirement(&requirement(Some(11.0), Some(3), Some(95.0)), &item(Some(12.0), Some(4), Some(120.0)));
        let b = score_requirement(&requirement(Some(12.0), Some(4), Some(120.0)), &item(Some(11.0), Some(3), Some(95.0)));
        assert_eq!(a, b);
    }

    #[test]
    fn bid_threshold_is_applied() {
        // voltage exact (30/30), cross-section far off (0/25): 55% -> bid
        let bid = score_requirement(&requirement(Some(11.0), None, Some(400.0)), &item(Some(11.0), None, Some(95.0)));
        assert!(bid.percent >= BID_THRESHOLD_PERCENT);
        assert!(bid.can_bid);

        // voltage far off, cross-section far off: 0% -> no bid
        let no_bid = score_requirement(&requirement(Some(33.0), None, Some(400.0)), &item(Some(11.0), None, Some(95.0)));
        assert!(!no_bid.can_bid);
    }

    #[test]
    fn tender_score_is_best_pair() {
        let tender = TenderRecord {
            tender_id: "T-1".into(),
            title: "HT cable".into(),
            organisation: "Metro Power Ltd".into(),
            city: "Mumbai".into(),
            due_date: "2026-09-15".into(),
            estimated_cost: None,
            requirements: vec![
                requirement(Some(11.0), Some(3), Some(95.0)),
                requirement(Some(33.0), Some(1), Some(400.0)),
            ],
        };
        let items = vec![item(Some(11.0), Some(3), Some(95.0))];
        let score = score_tender(&tender, &items);
        assert_eq!(score.percent, 100);
    }

    #[test]
    fn intent_overlay_refines_candidate_item() {
        let base = item(Some(11.0), Some(3), Some(95.0));
        let intent = SearchIntent {
            core_count: Some(4),
            ..SearchIntent::default()
        };
        let overlaid = apply_intent_overlay(&base, &intent);
        assert_eq!(overlaid.core_count, Some(4));
        assert_eq!(overlaid.cross_section_sqmm, Some(95.0));
    }
}
