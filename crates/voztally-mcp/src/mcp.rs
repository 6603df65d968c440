use rmcp::{
    ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{ErrorData as McpError, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;
use voztally::dates::DateNormalizer;
use voztally::utils::RecordFilter;
use voztally::variants::name_variants;
use voztally::{SearchConfig, WebScraper, run_search};

#[derive(Debug, Clone)]
pub struct McpServer {
    scraper: WebScraper,
    normalizer: DateNormalizer,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl McpServer {
    pub fn new() -> Result<Self, anyhow::Error> {
        Ok(Self {
            scraper: WebScraper::new()?,
            normalizer: DateNormalizer::new(),
            tool_router: Self::tool_router(),
        })
    }

    #[tool(
        name = "search_mentions",
        description = "Search La Voz de Galicia (lavozdegalicia.es) for a name and count the unique articles per fiscal month. Returns the articles with normalized dates, the per-month counts, the mean per month and whether the search ran out of results or hit a download error. Optional filters narrow the articles by date range, minimum year or fiscal month."
    )]
    pub async fn search_mentions(
        &self,
        Parameters(params): Parameters<SearchMentionsParams>,
    ) -> Result<String, McpError> {
        let report = run_search(
            &self.scraper,
            params.config,
            params.filter,
            self.normalizer.clone(),
        )
        .await
        .inspect_err(|e| log::error!("Invalid params: {e:?}"))
        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        let json = serde_json::to_string_pretty(&report)
            .inspect_err(|e| log::error!("Serialization error: {e:?}"))
            .map_err(|e| {
                McpError::internal_error(format!("Failed to serialize search report: {e:?}"), None)
            })?;

        Ok(json)
    }

    #[tool(
        name = "name_variants",
        description = "List the search terms generated for a full name: the name itself, the first initial with the surname, and the surname alone."
    )]
    pub async fn name_variants(
        &self,
        Parameters(params): Parameters<NameVariantsParams>,
    ) -> Result<String, McpError> {
        let json = serde_json::to_string_pretty(&name_variants(&params.name)).map_err(|e| {
            McpError::internal_error(format!("Failed to serialize variants: {e}"), None)
        })?;

        Ok(json)
    }

    #[tool(
        name = "normalize_dates",
        description = "Normalize raw date strings as found on search results (e.g. '18 de julio de 2025', 'hace 2 horas') into YYYY-MM-DD. Unrecognised strings are returned unchanged."
    )]
    pub async fn normalize_dates(
        &self,
        Parameters(params): Parameters<NormalizeDatesParams>,
    ) -> Result<String, McpError> {
        let normalized: Vec<String> = params
            .dates
            .iter()
            .map(|raw| self.normalizer.normalize(raw))
            .collect();

        let json = serde_json::to_string_pretty(&normalized).map_err(|e| {
            McpError::internal_error(format!("Failed to serialize dates: {e}"), None)
        })?;

        Ok(json)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchMentionsParams {
    config: SearchConfig,
    #[serde(default)]
    filter: RecordFilter,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NameVariantsParams {
    name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NormalizeDatesParams {
    dates: Vec<String>,
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(include_str!("./instructions.md").to_string()),
            ..Default::default()
        }
    }
}
