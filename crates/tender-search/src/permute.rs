/// Permutation generator.
///
/// Expands a `SearchIntent` into the full cross product of
/// {category} x {voltage-per-category} x {city-or-all-cities}. This is
/// intentionally exhaustive rather than a single greedy combination: a tender
/// may match through any one dimension, so the executor needs every combination
/// as an independent probe.
use tracing::warn;

use crate::catalog::CatalogIndex;
use crate::model::{SearchIntent, SearchPermutation};

/// Ceiling on generated permutations. Above it, city expansion is skipped in
/// favor of a single all-cities probe per (category, voltage); anything still
/// above it is truncated.
pub const MAX_PERMUTATIONS: usize = 60;

/// Generate the probe sequence for an intent. Never empty when
/// `intent.categories` is non-empty: a category with no detected voltage falls
/// back to its full known voltage set from the catalog.
pub fn generate_permutations(intent: &SearchIntent, catalog: &CatalogIndex) -> Vec<SearchPermutation> {
    let mut permutations = expand(intent, catalog, intent.city.as_deref());

    if permutations.len() > MAX_PERMUTATIONS && intent.city.is_some() {
        warn!(
            count = permutations.len(),
            cap = MAX_PERMUTATIONS,
            "permutation cap exceeded, skipping city expansion"
        );
        permutations = expand(intent, catalog, None);
    }
    if permutations.len() > MAX_PERMUTATIONS {
        warn!(
            count = permutations.len(),
            cap = MAX_PERMUTATIONS,
            "permutation cap still exceeded, truncating"
        );
        permutations.truncate(MAX_PERMUTATIONS);
    }

    permutations
}

fn expand(intent: &SearchIntent, catalog: &CatalogIndex, city: Option<&str>) -> Vec<SearchPermutation> {
    let mut permutations = Vec::new();
    for &category in &intent.categories {
        let known = catalog.voltages_for(category);

        // Intersect detected voltages with the category's known set; fall back
        // to the full set when nothing was detected or nothing intersects.
        let mut voltages: Vec<f64> = intent
            .voltages_kv
            .iter()
            .copied()
            .filter(|v| known.iter().any(|k| (k - v).abs() < 1e-6))
            .collect();
        if voltages.is_empty() {
            voltages = known.to_vec();
        }

        if voltages.is_empty() {
            // Catalog has no data for this category; still emit one probe so
            // category matching alone can fire.
            permutations.push(build(category, None, city));
            continue;
        }
        for v in voltages {
            permutations.push(build(category, Some(v), city));
        }
    }
    permutations
}

fn build(category: crate::model::CategoryTag, voltage_kv: Option<f64>, city: Option<&str>) -> SearchPermutation {
    SearchPermutation {
        category,
        voltage_kv,
        city: city.map(str::to_string),
        composed_keyword: compose_keyword(category, voltage_kv, city),
    }
}

/// Human-readable probe label, a pure function of the field tuple.
/// Examples: "11kV HT Power Cable in Mumbai", "LT Power Cable".
pub fn compose_keyword(
    category: crate::model::CategoryTag,
    voltage_kv: Option<f64>,
    city: Option<&str>,
) -> String {
    let mut label = String::new();
    if let Some(v) = voltage_kv {
        label.push_str(&format_kv(v));
        label.push(' ');
    }
    label.push_str(category.display_name());
    if let Some(city) = city {
        label.push_str(" in ");
        label.push_str(city);
    }
    label
}

/// "11" not "11.0"; "1.1" stays "1.1".
pub fn format_kv(voltage_kv: f64) -> String {
    if voltage_kv.fract() == 0.0 {
        format!("{}kV", voltage_kv as i64)
    } else {
        format!("{voltage_kv}kV")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CategoryTag;

    fn intent(categories: &[CategoryTag], voltages: &[f64], city: Option<&str>) -> SearchIntent {
        SearchIntent {
            categories: categories.iter().copied().collect(),
            voltages_kv: voltages.to_vec(),
            city: city.map(str::to_string),
            ..SearchIntent::default()
        }
    }

    #[test]
    fn count_is_categories_times_voltages() {
        let catalog = CatalogIndex::builtin();
        let i = intent(&[CategoryTag::HtPowerCable], &[11.0, 33.0], Some("Mumbai"));
        let permutations = generate_permutations(&i, &catalog);
        assert_eq!(permutations.len(), 2);
        assert!(permutations.iter().all(|p| p.city.as_deref() == Some("Mumbai")));
    }

    #[test]
    fn no_detected_voltage_falls_back_to_full_known_set() {
        let catalog = CatalogIndex::builtin();
        let i = intent(&[CategoryTag::HtPowerCable], &[], None);
        let permutations = generate_permutations(&i, &catalog);
        assert_eq!(
            permutations.len(),
            catalog.voltages_for(CategoryTag::HtPowerCable).len()
        );
    }

    #[test]
    fn no_duplicate_permutations() {
        let catalog = CatalogIndex::builtin();
        let i = intent(
            &[CategoryTag::HtPowerCable, CategoryTag::LtPowerCable],
            &[11.0, 1.1],
            Some("Pune"),
        );
        let permutations = generate_permutations(&i, &catalog);
        for (n, p) in permutations.iter().enumerate() {
            assert!(
                !permutations[n + 1..].contains(p),
                "duplicate permutation: {}",
                p.composed_keyword
            );
        }
    }

    #[test]
    fn unknown_voltage_falls_back_to_full_set() {
        let catalog = CatalogIndex::builtin();
        // 12 kV is not a standard HT class; the probe set must not be empty.
        let i = intent(&[CategoryTag::HtPowerCable], &[12.0], None);
        let permutations = generate_permutations(&i, &catalog);
        assert!(!permutations.is_empty());
    }

    #[test]
    fn cap_skips_city_expansion() {
        let tmp = tempfile::TempDir::new().unwrap();
        let voltages: Vec<String> = (1..=80).map(|n| format!("{n}.0")).collect();
        std::fs::write(
            tmp.path().join("ht_power_cable.json"),
            format!(
                r#"{{"voltages_kv": [{}], "core_counts": [3], "cross_sections_sqmm": [95.0], "items": []}}"#,
                voltages.join(", ")
            ),
        )
        .unwrap();
        let catalog = CatalogIndex::load(tmp.path());

        let i = intent(&[CategoryTag::HtPowerCable], &[], Some("Mumbai"));
        let permutations = generate_permutations(&i, &catalog);
        assert!(permutations.len() <= MAX_PERMUTATIONS);
        assert!(
            permutations.iter().all(|p| p.city.is_none()),
            "city expansion should be skipped past the cap"
        );
    }

    #[test]
    fn composed_keyword_is_pure_and_readable() {
        assert_eq!(
            compose_keyword(CategoryTag::HtPowerCable, Some(11.0), Some("Mumbai")),
            "11kV HT Power Cable in Mumbai"
        );
        assert_eq!(
            compose_keyword(CategoryTag::LtPowerCable, Some(1.1), None),
            "1.1kV LT Power Cable"
        );
        assert_eq!(
            compose_keyword(CategoryTag::ControlCable, None, None),
            "Control Cable"
        );
    }
}
