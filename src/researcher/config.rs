// SPDX-License-Identifier: MIT

//! Environment-sourced configuration
//!
//! Only the database location is validated up front. API keys are carried as
//! `Option`s and reported by the collaborator that needs them on first use.

use crate::adk::error::{ResearchError, Result};
use crate::adk::model::gemini::DEFAULT_MODEL;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_SESSION_ID: &str = "arxiv_research_agent";
pub const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub google_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub model_name: String,
    pub session_id: String,
    pub search_max_results: usize,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        let vars: HashMap<String, String> = env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Load configuration from an explicit variable map
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let lookup = |key: &str| vars.get(key).filter(|v| !v.trim().is_empty()).cloned();

        let database_url = lookup("DATABASE_URL").ok_or_else(|| {
            ResearchError::config("DATABASE_URL is missing in environment variables.")
        })?;

        let search_max_results = match lookup("SEARCH_MAX_RESULTS") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                ResearchError::config(format!("SEARCH_MAX_RESULTS must be a number, got '{}'", raw))
            })?,
            None => DEFAULT_MAX_RESULTS,
        };
        if search_max_results < 1 {
            return Err(ResearchError::config("SEARCH_MAX_RESULTS must be at least 1"));
        }

        let config = Self {
            database_path: database_path(&database_url),
            google_api_key: lookup("GOOGLE_API_KEY"),
            tavily_api_key: lookup("TAVILY_API_KEY"),
            model_name: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            session_id: lookup("RESEARCH_SESSION_ID")
                .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string()),
            search_max_results,
        };

        log::info!(
            "Config: database={}, model={}, session={}, has_google_key={}, has_tavily_key={}",
            config.database_path.display(),
            config.model_name,
            config.session_id,
            config.google_api_key.is_some(),
            config.tavily_api_key.is_some()
        );

        Ok(config)
    }
}

/// Strip an optional URL scheme from the database location
fn database_path(url: &str) -> PathBuf {
    let trimmed = url.trim();
    let path = trimmed
        .strip_prefix("redb://")
        .or_else(|| trimmed.strip_prefix("file://"))
        .unwrap_or(trimmed);
    PathBuf::from(path)
}
