use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

use crate::errors::AppError;
use crate::tools::Tool;

#[derive(Debug, Serialize)]
struct JoobleQuery<'a> {
    keywords: &'a str,
    location: &'a str,
}

/// Jooble job-search API: `POST http://{host}/api/{key}`.
#[derive(Clone)]
pub struct JoobleClient {
    client: Client,
    host: String,
    key: String,
}

impl JoobleClient {
    pub fn new(host: String, key: String) -> Self {
        Self {
            client: Client::new(),
            host,
            key,
        }
    }

    fn search_url(&self) -> String {
        format!("http://{}/api/{}", self.host, self.key)
    }

    /// Returns the job list as pretty-printed JSON, or `None` after logging a transport
    /// error or any non-200 status.
    pub async fn search(&self, keywords: &str, location: &str) -> Option<String> {
        let response = self
            .client
            .post(self.search_url())
            .header("Content-type", "application/json")
            .json(&JoobleQuery { keywords, location })
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                error!("Jooble request failed: {e}");
                return None;
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            error!(
                "Jooble returned {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            );
            return None;
        }

        let body: serde_json::Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                error!("Jooble response was not JSON: {e}");
                return None;
            }
        };

        debug!(
            total = body.get("totalCount").and_then(|v| v.as_u64()).unwrap_or(0),
            "Jooble search succeeded"
        );
        serde_json::to_string_pretty(&body).ok()
    }
}

/// Job-search tool with keywords and location bound at construction.
/// The agent's `Action Input` is ignored.
pub struct JobSearchTool {
    jooble: JoobleClient,
    keywords: String,
    location: String,
}

impl JobSearchTool {
    pub fn new(jooble: JoobleClient, keywords: String, location: String) -> Self {
        Self {
            jooble,
            keywords,
            location,
        }
    }
}

#[async_trait]
impl Tool for JobSearchTool {
    fn name(&self) -> &str {
        "job_search"
    }

    fn description(&self) -> &str {
        "Fetches the current job postings matching the search keywords and location as JSON. \
        Takes no input."
    }

    async fn run(&self, _input: &str) -> Result<String, AppError> {
        match self.jooble.search(&self.keywords, &self.location).await {
            Some(jobs) => Ok(jobs),
            None => {
                error!("Failed to fetch jobs from Jooble");
                Err(AppError::ExternalCall(
                    "Failed to fetch jobs from Jooble".to_string(),
                ))
            }
        }
    }
}
