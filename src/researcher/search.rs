// SPDX-License-Identifier: MIT

//! Web search collaborator backed by the Tavily search API

use crate::adk::error::{ResearchError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

/// Free-text search returning results in provider order
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

pub struct TavilySearch {
    client: Client,
    api_key: Option<String>,
    max_results: usize,
}

impl TavilySearch {
    pub fn new(api_key: Option<String>, max_results: usize) -> Self {
        Self {
            client: Client::new(),
            api_key,
            max_results,
        }
    }
}

/// Map a Tavily response body to search results
pub fn parse_tavily_results(body: &Value) -> Result<Vec<SearchResult>> {
    let results = body
        .get("results")
        .and_then(|r| r.as_array())
        .ok_or_else(|| ResearchError::api("tavily", "Invalid response format: missing results"))?;

    Ok(results
        .iter()
        .map(|r| SearchResult {
            title: r["title"].as_str().unwrap_or("Untitled").to_string(),
            url: r["url"].as_str().unwrap_or_default().to_string(),
            snippet: r["content"].as_str().unwrap_or_default().to_string(),
        })
        .collect())
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ResearchError::config("TAVILY_API_KEY must be set"))?;

        log::info!("Tavily search: {}", query);

        let body = json!({
            "api_key": api_key,
            "query": query,
            "max_results": self.max_results,
        });

        let resp = self.client.post(TAVILY_ENDPOINT).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await?;
            return Err(ResearchError::api("tavily", format!("{}: {}", status, text)));
        }

        let body: Value = resp.json().await?;
        let results = parse_tavily_results(&body)?;
        log::info!("Tavily returned {} results", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_results_maps_content_to_snippet() {
        let body = json!({
            "query": "surface codes",
            "results": [
                {
                    "title": "Surface codes below threshold",
                    "url": "https://arxiv.org/abs/2408.13687",
                    "content": "We demonstrate a logical qubit...",
                    "score": 0.93
                },
                { "url": "https://arxiv.org/abs/0000.00000" }
            ]
        });

        let results = parse_tavily_results(&body).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Surface codes below threshold");
        assert_eq!(results[0].snippet, "We demonstrate a logical qubit...");
        assert_eq!(results[1].title, "Untitled");
        assert_eq!(results[1].snippet, "");
    }

    #[test]
    fn test_parse_results_missing_array() {
        let err = parse_tavily_results(&json!({ "detail": "Unauthorized" })).unwrap_err();
        assert!(matches!(err, ResearchError::Api { .. }));
    }

    #[tokio::test]
    async fn test_missing_key_fails_at_call_time() {
        let search = TavilySearch::new(None, 5);
        let err = search.search("anything").await.unwrap_err();
        assert!(matches!(err, ResearchError::Config(_)));
    }
}
