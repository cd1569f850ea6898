use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::errors::AppError;
use crate::tools::Tool;

const SERPER_SEARCH_URL: &str = "https://google.serper.dev/search";
/// Results returned to the agent per query.
pub const N_RESULTS: usize = 5;

#[derive(Debug, Serialize)]
struct SerperQuery<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Web search over Serper, used to research hiring companies.
pub struct CompanySearchTool {
    client: Client,
    api_key: String,
    url: String,
}

impl CompanySearchTool {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            url: SERPER_SEARCH_URL.to_string(),
        }
    }

    /// Points the tool at a different search endpoint.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl Tool for CompanySearchTool {
    fn name(&self) -> &str {
        "company_search"
    }

    fn description(&self) -> &str {
        "Searches the internet and returns the top results. \
        Input: the search query, e.g. 'Acme Corp employee reviews'."
    }

    async fn run(&self, input: &str) -> Result<String, AppError> {
        let query = input.trim().trim_matches('"');
        if query.is_empty() {
            return Ok("The search query cannot be empty. Provide a query as the Action Input.".to_string());
        }

        let response = self
            .client
            .post(&self.url)
            .header("X-API-KEY", &self.api_key)
            .header("content-type", "application/json")
            .json(&SerperQuery {
                q: query,
                num: N_RESULTS,
            })
            .send()
            .await
            .map_err(|e| AppError::ExternalCall(format!("Serper request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Serper search failed: {body}");
            return Err(AppError::ExternalCall(format!(
                "Serper returned {}",
                status.as_u16()
            )));
        }

        let results: SerperResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalCall(format!("Serper response was not JSON: {e}")))?;

        debug!(query, hits = results.organic.len(), "Serper search succeeded");
        Ok(format_results(&results.organic))
    }
}

fn format_results(results: &[OrganicResult]) -> String {
    let blocks: Vec<String> = results
        .iter()
        .take(N_RESULTS)
        .map(|r| format!("Title: {}\nLink: {}\nSnippet: {}", r.title, r.link, r.snippet))
        .collect();

    if blocks.is_empty() {
        return "No results found.".to_string();
    }
    format!("\nSearch results: {}\n", blocks.join("\n---\n"))
}
