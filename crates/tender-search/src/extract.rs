/// Query understanding: structured intent extraction from free text.
///
/// Free text goes in, a structured `SearchIntent` comes out. Extraction never
/// fails: an empty or purely conversational query yields an intent with an
/// empty category set, which the pipeline surfaces as a "query needs
/// refinement" outcome instead of scanning feeds.
///
/// Detection is organized as an ordered list of independent, named detector
/// functions. Each detector returns a partial `SearchIntent`; partials are
/// composed by structural merge (set union for categories, ordered append for
/// voltages, first-wins for scalar fields). Detectors are order-independent
/// except for display: voltage order follows detection order.
use regex::Regex;

use crate::catalog::category_for_voltage;
use crate::model::{CategoryTag, ConductorMaterial, Insulation, SearchIntent};

/// Fixed city gazetteer. Matching is case-insensitive on whole words; the
/// canonical spelling below is what ends up in the intent.
const CITIES: &[&str] = &[
    "Mumbai", "Delhi", "Pune", "Chennai", "Kolkata", "Bengaluru", "Hyderabad",
    "Ahmedabad", "Nagpur", "Jaipur", "Lucknow", "Surat", "Bhopal", "Patna",
];

/// Known portal/feed identifiers.
const PORTALS: &[&str] = &["gem", "eprocure", "ireps"];

struct Query<'a> {
    raw: &'a str,
    lower: String,
}

type Detector = fn(&Query) -> SearchIntent;

/// All detectors, in the order their findings are merged.
const DETECTORS: &[Detector] = &[
    detect_categories,
    detect_voltages,
    detect_core_count,
    detect_cross_section,
    detect_conductor_material,
    detect_insulation,
    detect_armoured,
    detect_city,
    detect_portal,
    detect_organisation,
];

/// Extract a structured intent from raw query text.
///
/// If no category keyword was detected but at least one voltage was, each
/// voltage is mapped to its governing category band and the union becomes the
/// category set. Explicit category keywords take precedence: when both are
/// present, no band inference happens.
pub fn extract_intent(text: &str) -> SearchIntent {
    let query = Query {
        raw: text,
        lower: text.to_lowercase(),
    };

    let mut intent = SearchIntent::default();
    for detector in DETECTORS {
        merge(&mut intent, detector(&query));
    }

    if intent.categories.is_empty() && !intent.voltages_kv.is_empty() {
        for &v in &intent.voltages_kv {
            intent.categories.insert(category_for_voltage(v));
        }
    }

    intent
}

/// Structural merge of one detector's partial result into the accumulator.
fn merge(into: &mut SearchIntent, partial: SearchIntent) {
    into.categories.extend(partial.categories);
    for v in partial.voltages_kv {
        if !into.voltages_kv.iter().any(|&existing| (existing - v).abs() < 1e-6) {
            into.voltages_kv.push(v);
        }
    }
    into.core_count = into.core_count.or(partial.core_count);
    into.cross_section_sqmm = into.cross_section_sqmm.or(partial.cross_section_sqmm);
    into.conductor_material = into.conductor_material.or(partial.conductor_material);
    into.insulation = into.insulation.or(partial.insulation);
    into.armoured = into.armoured.or(partial.armoured);
    into.city = into.city.take().or(partial.city);
    into.portal = into.portal.take().or(partial.portal);
    into.organisation = into.organisation.take().or(partial.organisation);
}

fn detect_categories(q: &Query) -> SearchIntent {
    // (pattern, tag) pairs; patterns are whole-word and cover common synonyms
    // and plurals.
    const SYNONYMS: &[(&str, CategoryTag)] = &[
        (r"\bht\b|\bhigh[ -]tension\b", CategoryTag::HtPowerCable),
        (r"\blt\b|\blv\b|\blow[ -]tension\b", CategoryTag::LtPowerCable),
        (r"\behv\b|\bextra[ -]high[ -]voltage\b", CategoryTag::EhvPowerCable),
        (r"\bcontrol cables?\b", CategoryTag::ControlCable),
        (r"\babc\b|\bab cables?\b|\baerial bunched\b", CategoryTag::AerialBunchedCable),
    ];

    let mut partial = SearchIntent::default();
    for (pattern, tag) in SYNONYMS {
        let re = Regex::new(pattern).expect("valid regex");
        if re.is_match(&q.lower) {
            partial.categories.insert(*tag);
        }
    }
    partial
}

fn detect_voltages(q: &Query) -> SearchIntent {
    let re = Regex::new(r"(\d+(?:\.\d+)?)\s*(kv|v)\b").expect("valid regex");
    let mut partial = SearchIntent::default();
    for caps in re.captures_iter(&q.lower) {
        let Ok(value) = caps[1].parse::<f64>() else {
            continue;
        };
        // Plain volts are normalized to kV (e.g. "415v" -> 0.415 kV).
        let kv = if &caps[2] == "kv" { value } else { value / 1000.0 };
        if kv > 0.0 {
            partial.voltages_kv.push(kv);
        }
    }
    partial
}

fn detect_core_count(q: &Query) -> SearchIntent {
    // "3 core", "4-core", "3c" (as in "3C x 300 sqmm")
    let re = Regex::new(r"\b(\d{1,2})[ -]?cores?\b|\b(\d{1,2})c\b").expect("valid regex");
    let mut partial = SearchIntent::default();
    if let Some(caps) = re.captures(&q.lower) {
        let digits = caps.get(1).or_else(|| caps.get(2));
        partial.core_count = digits.and_then(|m| m.as_str().parse().ok());
    }
    partial
}

fn detect_cross_section(q: &Query) -> SearchIntent {
    let re = Regex::new(r"(\d+(?:\.\d+)?)\s*(?:sq\.?\s?mm|sqmm|mm2|mm²)").expect("valid regex");
    let mut partial = SearchIntent::default();
    if let Some(caps) = re.captures(&q.lower) {
        partial.cross_section_sqmm = caps[1].parse().ok();
    }
    partial
}

fn detect_conductor_material(q: &Query) -> SearchIntent {
    let mut partial = SearchIntent::default();
    if q.lower.contains("copper") {
        partial.conductor_material = Some(ConductorMaterial::Copper);
    } else if q.lower.contains("aluminium") || q.lower.contains("aluminum") {
        partial.conductor_material = Some(ConductorMaterial::Aluminium);
    }
    partial
}

fn detect_insulation(q: &Query) -> SearchIntent {
    let mut partial = SearchIntent::default();
    if q.lower.contains("xlpe") {
        partial.insulation = Some(Insulation::Xlpe);
    } else if q.lower.contains("pvc") {
        partial.insulation = Some(Insulation::Pvc);
    } else if q.lower.contains("epr") {
        partial.insulation = Some(Insulation::Epr);
    }
    partial
}

fn detect_armoured(q: &Query) -> SearchIntent {
    let mut partial = SearchIntent::default();
    // "unarmoured" contains "armoured", so check the negation first.
    if q.lower.contains("unarmoured") || q.lower.contains("unarmored") {
        partial.armoured = Some(false);
    } else if q.lower.contains("armoured") || q.lower.contains("armored") {
        partial.armoured = Some(true);
    }
    partial
}

fn detect_city(q: &Query) -> SearchIntent {
    let mut partial = SearchIntent::default();
    for city in CITIES {
        let pattern = format!(r"\b{}\b", city.to_lowercase());
        let re = Regex::new(&pattern).expect("valid regex");
        if re.is_match(&q.lower) {
            partial.city = Some((*city).to_string());
            break;
        }
    }
    partial
}

fn detect_portal(q: &Query) -> SearchIntent {
    let mut partial = SearchIntent::default();
    for portal in PORTALS {
        let pattern = format!(r"\b{portal}\b");
        let re = Regex::new(&pattern).expect("valid regex");
        if re.is_match(&q.lower) {
            partial.portal = Some((*portal).to_string());
            break;
        }
    }
    partial
}

fn detect_organisation(q: &Query) -> SearchIntent {
    // Heuristic: a run of capitalized words ending in a legal-entity suffix,
    // e.g. "Tata Power Ltd", "Maharashtra State Electricity Board".
    let re = Regex::new(
        r"\b([A-Z][A-Za-z&]*(?:\s+[A-Z][A-Za-z&]*){0,5}\s+(?:Ltd\.?|Limited|Corporation|Corp\.?|Board|Nigam|Discom))",
    )
    .expect("valid regex");
    let mut partial = SearchIntent::default();
    if let Some(caps) = re.captures(q.raw) {
        partial.organisation = Some(caps[1].trim().to_string());
    }
    partial
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_and_voltage_and_city() {
        let intent = extract_intent("11kV HT cable in Mumbai");
        assert!(intent.categories.contains(&CategoryTag::HtPowerCable));
        assert_eq!(intent.categories.len(), 1);
        assert_eq!(intent.voltages_kv, vec![11.0]);
        assert_eq!(intent.city.as_deref(), Some("Mumbai"));
    }

    #[test]
    fn voltage_without_category_infers_band() {
        let intent = extract_intent("need 11 kv cable tenders");
        assert!(intent.categories.contains(&CategoryTag::HtPowerCable));

        let intent = extract_intent("415v supply cable");
        assert!(intent.categories.contains(&CategoryTag::LtPowerCable));
        assert!((intent.voltages_kv[0] - 0.415).abs() < 1e-9);

        let intent = extract_intent("132kv transmission line cable");
        assert!(intent.categories.contains(&CategoryTag::EhvPowerCable));
    }

    #[test]
    fn explicit_category_suppresses_band_inference() {
        // 33kV alone would infer HT; the explicit "control cable" keyword wins
        // and no extra band category is added.
        let intent = extract_intent("control cable rated 33kv");
        assert!(intent.categories.contains(&CategoryTag::ControlCable));
        assert!(!intent.categories.contains(&CategoryTag::HtPowerCable));
    }

    #[test]
    fn multiple_categories_and_voltages_are_not_paired() {
        let intent = extract_intent("HT and LT cables, 11kv and 1.1kv");
        assert!(intent.categories.contains(&CategoryTag::HtPowerCable));
        assert!(intent.categories.contains(&CategoryTag::LtPowerCable));
        assert_eq!(intent.voltages_kv, vec![11.0, 1.1]);
    }

    #[test]
    fn spec_fields_detected() {
        let intent = extract_intent("3 core 95 sqmm copper xlpe armoured cable");
        assert_eq!(intent.core_count, Some(3));
        assert_eq!(intent.cross_section_sqmm, Some(95.0));
        assert_eq!(intent.conductor_material, Some(ConductorMaterial::Copper));
        assert_eq!(intent.insulation, Some(Insulation::Xlpe));
        assert_eq!(intent.armoured, Some(true));
    }

    #[test]
    fn compact_core_notation() {
        let intent = extract_intent("11kv 3c x 300 sqmm");
        assert_eq!(intent.core_count, Some(3));
        assert_eq!(intent.cross_section_sqmm, Some(300.0));
    }

    #[test]
    fn unarmoured_wins_over_armoured_substring() {
        let intent = extract_intent("unarmoured lt cable");
        assert_eq!(intent.armoured, Some(false));
    }

    #[test]
    fn organisation_suffix_heuristic() {
        let intent = extract_intent("tenders from Tata Power Ltd for HT cable");
        assert_eq!(intent.organisation.as_deref(), Some("Tata Power Ltd"));
    }

    #[test]
    fn portal_detected() {
        let intent = extract_intent("ht cable tenders on gem portal");
        assert_eq!(intent.portal.as_deref(), Some("gem"));
    }

    #[test]
    fn conversational_text_yields_empty_intent() {
        let intent = extract_intent("hello, how are you doing today?");
        assert!(intent.categories.is_empty());
        assert!(intent.voltages_kv.is_empty());
        assert!(intent.city.is_none());
    }

    #[test]
    fn empty_query_yields_empty_intent() {
        let intent = extract_intent("");
        assert!(intent.categories.is_empty());
    }

    #[test]
    fn duplicate_voltages_deduplicated() {
        let intent = extract_intent("11kv cable, 11 kv, rated 11kv");
        assert_eq!(intent.voltages_kv, vec![11.0]);
    }
}
