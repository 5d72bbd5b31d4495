/// MCP server implementation for tender discovery.
///
/// Exposes five tools:
/// - `find_tenders`: Run the full discovery pipeline for a natural-language query
/// - `match_specification`: Score one requirement against one catalog item
/// - `list_feeds`: Enumerate configured tender feeds and their health
/// - `list_catalog`: Summarize the product catalog by category
/// - `refresh_feeds`: Drop cached snapshots so searches re-read feed files
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::info;

use crate::catalog::CatalogItem;
use crate::model::{CategoryTag, ConductorMaterial, Insulation, RequirementLine};
use crate::pipeline::{DEFAULT_LIMIT, Overrides, Pipeline};
use crate::score::score_requirement;
use tender_common::api::{
    CatalogCategoryInfo, FeedInfo, FindTendersParams, ListCatalogResponse, ListFeedsResponse,
    MatchSpecificationParams, MatchSpecificationResponse, RefreshFeedsResponse, SpecAttributes,
    TenderSearchResponse,
};

#[derive(Clone)]
pub struct TenderSearchServer {
    pipeline: Arc<Pipeline>,
    tool_router: ToolRouter<TenderSearchServer>,
}

impl TenderSearchServer {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl TenderSearchServer {
    #[tool(description = "Search live tender feeds for cable procurement opportunities. Detects category, voltage, city, portal and organisation from the query, fans out search permutations, and returns deduplicated tenders ranked by due date with specification match scores.")]
    async fn find_tenders(
        &self,
        Parameters(params): Parameters<FindTendersParams>,
    ) -> Result<Json<TenderSearchResponse>, String> {
        let query = params.query.trim().to_string();
        if query.is_empty() {
            return Err("query must not be empty".to_string());
        }

        let category = params
            .category
            .as_deref()
            .map(|tag| {
                CategoryTag::parse_tag(tag).ok_or_else(|| {
                    let known: Vec<&str> =
                        crate::catalog::ALL_CATEGORIES.iter().map(|c| c.tag()).collect();
                    format!("unknown category: '{tag}'. Known categories: {}", known.join(", "))
                })
            })
            .transpose()?;

        let overrides = Overrides {
            category,
            voltage_kv: params.voltage_kv,
            city: params.city,
        };
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT as u32) as usize;

        info!(query, "find_tenders tool invoked");
        Ok(Json(self.pipeline.run(&query, &overrides, limit).await))
    }

    #[tool(description = "Score one tender requirement against one catalog item. Returns a normalized specification match percentage and whether it clears the bid-eligibility threshold. Attributes absent on either side are excluded from the comparison.")]
    async fn match_specification(
        &self,
        Parameters(params): Parameters<MatchSpecificationParams>,
    ) -> Result<Json<MatchSpecificationResponse>, String> {
        let requirement = to_requirement(&params.requirement)?;
        let item = to_catalog_item(&params.catalog_item)?;
        let score = score_requirement(&requirement, &item);
        Ok(Json(MatchSpecificationResponse {
            spec_match_percent: score.percent,
            can_bid: score.can_bid,
        }))
    }

    #[tool(description = "List the configured tender feeds with their current availability and record counts.")]
    async fn list_feeds(&self) -> Result<Json<ListFeedsResponse>, String> {
        Ok(Json(ListFeedsResponse {
            feeds: self.feed_infos(),
        }))
    }

    #[tool(description = "Drop all cached feed snapshots and search results so the next search re-reads every feed from source. Use after a feed file has been updated.")]
    async fn refresh_feeds(&self) -> Result<Json<RefreshFeedsResponse>, String> {
        info!("refresh_feeds tool invoked");
        let cache_invalidated = self.pipeline.cache().invalidate_all().await;
        Ok(Json(RefreshFeedsResponse {
            cache_invalidated,
            feeds: self.feed_infos(),
        }))
    }

    #[tool(description = "Summarize the vendor's product catalog: categories, known voltage classes, core counts and cross-sections.")]
    async fn list_catalog(&self) -> Result<Json<ListCatalogResponse>, String> {
        let categories = self
            .pipeline
            .catalog()
            .categories()
            .map(|(tag, cat)| CatalogCategoryInfo {
                category: tag.tag().to_string(),
                display_name: tag.display_name().to_string(),
                voltages_kv: cat.voltages_kv.clone(),
                core_counts: cat.core_counts.clone(),
                cross_sections_sqmm: cat.cross_sections_sqmm.clone(),
                item_count: cat.items.len(),
            })
            .collect();
        Ok(Json(ListCatalogResponse { categories }))
    }
}

impl TenderSearchServer {
    fn feed_infos(&self) -> Vec<FeedInfo> {
        let registry = self.pipeline.registry();
        registry
            .feed_ids()
            .into_iter()
            .map(|id| match registry.load(&id) {
                Ok(snapshot) => FeedInfo {
                    id,
                    available: true,
                    record_count: snapshot.records.len(),
                },
                Err(_) => FeedInfo {
                    id,
                    available: false,
                    record_count: 0,
                },
            })
            .collect()
    }
}

fn to_requirement(spec: &SpecAttributes) -> Result<RequirementLine, String> {
    Ok(RequirementLine {
        category: None,
        voltage_kv: spec.voltage_kv,
        core_count: spec.core_count,
        cross_section_sqmm: spec.cross_section_sqmm,
        conductor_material: parse_material(spec.conductor_material.as_deref())?,
        insulation: parse_insulation(spec.insulation.as_deref())?,
        armoured: spec.armoured,
        quantity_km: None,
    })
}

fn to_catalog_item(spec: &SpecAttributes) -> Result<CatalogItem, String> {
    Ok(CatalogItem {
        voltage_kv: spec.voltage_kv,
        core_count: spec.core_count,
        cross_section_sqmm: spec.cross_section_sqmm,
        conductor_material: parse_material(spec.conductor_material.as_deref())?,
        insulation: parse_insulation(spec.insulation.as_deref())?,
        armoured: spec.armoured,
    })
}

fn parse_material(value: Option<&str>) -> Result<Option<ConductorMaterial>, String> {
    match value.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        None | Some("") => Ok(None),
        Some("copper" | "cu") => Ok(Some(ConductorMaterial::Copper)),
        Some("aluminium" | "aluminum" | "al") => Ok(Some(ConductorMaterial::Aluminium)),
        Some(other) => Err(format!(
            "unknown conductor_material: '{other}' (expected copper or aluminium)"
        )),
    }
}

fn parse_insulation(value: Option<&str>) -> Result<Option<Insulation>, String> {
    match value.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        None | Some("") => Ok(None),
        Some("xlpe") => Ok(Some(Insulation::Xlpe)),
        Some("pvc") => Ok(Some(Insulation::Pvc)),
        Some("epr") => Ok(Some(Insulation::Epr)),
        Some(other) => Err(format!(
            "unknown insulation: '{other}' (expected xlpe, pvc or epr)"
        )),
    }
}

#[tool_handler]
impl ServerHandler for TenderSearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "tender-search".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Tender discovery MCP server for a power-cable vendor. Use find_tenders \
                 for natural-language queries over the configured procurement feeds \
                 (e.g. '11kV HT cable tenders in Mumbai'), match_specification to score \
                 a single requirement against a catalog item, list_feeds to inspect feed \
                 health, list_catalog to browse the product catalog, and refresh_feeds \
                 after a feed file changes."
                    .to_string(),
            ),
        }
    }
}
