/// Catalog index: per-category reference data used to seed search permutations
/// and to supply the candidate-item side of specification matching.
///
/// Loaded once at startup from one JSON document per category under
/// `CATALOG_DIR` (falling back to built-in seed data per category), then
/// treated as immutable for the lifetime of the process. Re-seeding requires a
/// restart, so no locking is needed anywhere downstream.
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::{CategoryTag, ConductorMaterial, Insulation};

pub const ALL_CATEGORIES: [CategoryTag; 5] = [
    CategoryTag::LtPowerCable,
    CategoryTag::HtPowerCable,
    CategoryTag::EhvPowerCable,
    CategoryTag::ControlCable,
    CategoryTag::AerialBunchedCable,
];

/// A concrete product the vendor can offer. Absent attributes are simply not
/// compared during scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogItem {
    pub voltage_kv: Option<f64>,
    pub core_count: Option<u32>,
    pub cross_section_sqmm: Option<f64>,
    pub conductor_material: Option<ConductorMaterial>,
    pub insulation: Option<Insulation>,
    pub armoured: Option<bool>,
}

/// Reference data for one product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCatalog {
    pub voltages_kv: Vec<f64>,
    pub core_counts: Vec<u32>,
    pub cross_sections_sqmm: Vec<f64>,
    #[serde(default)]
    pub items: Vec<CatalogItem>,
}

pub struct CatalogIndex {
    categories: BTreeMap<CategoryTag, CategoryCatalog>,
}

impl CatalogIndex {
    /// Built-in seed data covering the standard cable families. Used when no
    /// catalog directory is configured, and per category when its file is absent.
    pub fn builtin() -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(CategoryTag::LtPowerCable, builtin_lt());
        categories.insert(CategoryTag::HtPowerCable, builtin_ht());
        categories.insert(CategoryTag::EhvPowerCable, builtin_ehv());
        categories.insert(CategoryTag::ControlCable, builtin_control());
        categories.insert(CategoryTag::AerialBunchedCable, builtin_abc());
        Self { categories }
    }

    /// Load the catalog from `dir`, one `<category_tag>.json` per category.
    /// A category whose file is missing or unreadable keeps its built-in data;
    /// a present-but-corrupt file is reported, not silently ignored.
    pub fn load(dir: &Path) -> Self {
        let mut index = Self::builtin();
        for tag in ALL_CATEGORIES {
            let path = dir.join(format!("{}.json", tag.tag()));
            let Ok(raw) = std::fs::read_to_string(&path) else {
                continue;
            };
            match serde_json::from_str::<CategoryCatalog>(&raw) {
                Ok(catalog) => {
                    info!(category = tag.tag(), path = %path.display(), "catalog file loaded");
                    index.categories.insert(tag, catalog);
                }
                Err(e) => {
                    warn!(category = tag.tag(), path = %path.display(), error = %e,
                        "catalog file unreadable, keeping built-in data");
                }
            }
        }
        index
    }

    pub fn get(&self, category: CategoryTag) -> Option<&CategoryCatalog> {
        self.categories.get(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = (CategoryTag, &CategoryCatalog)> {
        self.categories.iter().map(|(tag, cat)| (*tag, cat))
    }

    /// Known voltage value set for a category, used when the query named the
    /// category but no voltage.
    pub fn voltages_for(&self, category: CategoryTag) -> &[f64] {
        self.categories
            .get(&category)
            .map(|c| c.voltages_kv.as_slice())
            .unwrap_or(&[])
    }

    pub fn items_for(&self, category: CategoryTag) -> &[CatalogItem] {
        self.categories
            .get(&category)
            .map(|c| c.items.as_slice())
            .unwrap_or(&[])
    }
}

/// Map a voltage to its governing category band: up to 1.1 kV is the
/// low-tension family, 66 kV and above is extra-high-voltage, everything in
/// between (3.3/6.6/11/22/33 kV) is high-tension.
pub fn category_for_voltage(voltage_kv: f64) -> CategoryTag {
    if voltage_kv <= 1.1 {
        CategoryTag::LtPowerCable
    } else if voltage_kv < 66.0 {
        CategoryTag::HtPowerCable
    } else {
        CategoryTag::EhvPowerCable
    }
}

fn item(
    voltage_kv: f64,
    core_count: u32,
    cross_section_sqmm: f64,
    conductor_material: ConductorMaterial,
    insulation: Insulation,
    armoured: bool,
) -> CatalogItem {
    CatalogItem {
        voltage_kv: Some(voltage_kv),
        core_count: Some(core_count),
        cross_section_sqmm: Some(cross_section_sqmm),
        conductor_material: Some(conductor_material),
        insulation: Some(insulation),
        armoured: Some(armoured),
    }
}

fn builtin_lt() -> CategoryCatalog {
    CategoryCatalog {
        voltages_kv: vec![0.415, 0.65, 1.1],
        core_counts: vec![2, 3, 4],
        cross_sections_sqmm: vec![25.0, 35.0, 50.0, 70.0, 95.0, 120.0, 150.0, 185.0, 240.0, 300.0],
        items: vec![
            item(1.1, 4, 95.0, ConductorMaterial::Aluminium, Insulation::Xlpe, true),
            item(1.1, 4, 240.0, ConductorMaterial::Aluminium, Insulation::Xlpe, true),
            item(1.1, 3, 120.0, ConductorMaterial::Copper, Insulation::Pvc, true),
            item(0.65, 2, 35.0, ConductorMaterial::Copper, Insulation::Pvc, false),
        ],
    }
}

fn builtin_ht() -> CategoryCatalog {
    CategoryCatalog {
        voltages_kv: vec![3.3, 6.6, 11.0, 22.0, 33.0],
        core_counts: vec![1, 3],
        cross_sections_sqmm: vec![95.0, 120.0, 150.0, 185.0, 240.0, 300.0, 400.0],
        items: vec![
            item(11.0, 3, 95.0, ConductorMaterial::Aluminium, Insulation::Xlpe, true),
            item(11.0, 3, 240.0, ConductorMaterial::Aluminium, Insulation::Xlpe, true),
            item(22.0, 3, 300.0, ConductorMaterial::Aluminium, Insulation::Xlpe, true),
            item(33.0, 1, 400.0, ConductorMaterial::Aluminium, Insulation::Xlpe, false),
        ],
    }
}

fn builtin_ehv() -> CategoryCatalog {
    CategoryCatalog {
        voltages_kv: vec![66.0, 110.0, 132.0, 220.0],
        core_counts: vec![1],
        cross_sections_sqmm: vec![400.0, 630.0, 1000.0],
        items: vec![
            item(66.0, 1, 630.0, ConductorMaterial::Copper, Insulation::Xlpe, false),
            item(132.0, 1, 1000.0, ConductorMaterial::Copper, Insulation::Xlpe, false),
        ],
    }
}

fn builtin_control() -> CategoryCatalog {
    CategoryCatalog {
        voltages_kv: vec![1.1],
        core_counts: vec![4, 6, 10, 12, 19, 24],
        cross_sections_sqmm: vec![1.5, 2.5],
        items: vec![
            item(1.1, 12, 2.5, ConductorMaterial::Copper, Insulation::Pvc, true),
            item(1.1, 19, 1.5, ConductorMaterial::Copper, Insulation::Pvc, true),
        ],
    }
}

fn builtin_abc() -> CategoryCatalog {
    CategoryCatalog {
        voltages_kv: vec![0.65, 1.1],
        core_counts: vec![2, 4],
        cross_sections_sqmm: vec![16.0, 25.0, 35.0, 50.0, 95.0],
        items: vec![
            item(1.1, 4, 50.0, ConductorMaterial::Aluminium, Insulation::Xlpe, false),
            item(1.1, 2, 25.0, ConductorMaterial::Aluminium, Insulation::Xlpe, false),
        ],
    }
}
