// SPDX-License-Identifier: MIT

//! Model module - defines the LLM model trait and shared message types
//!
//! The only hosted implementation lives in [gemini].

pub mod gemini;

use crate::adk::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
}

/// A role-tagged message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

/// Parts of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Part {
    /// Regular text output from the model
    Text(String),
    /// Thinking/reasoning content from thinking models, never sent back
    Thinking(String),
}

impl Content {
    /// Single-part user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Single-part model message
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Concatenated text parts, skipping thinking output
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::Thinking(_) => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Core trait for LLM model implementations
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_skips_thinking() {
        let content = Content {
            role: "model".to_string(),
            parts: vec![
                Part::Thinking("considering sources".to_string()),
                Part::Text("Summary".to_string()),
                Part::Text(" of findings".to_string()),
            ],
        };
        assert_eq!(content.text(), "Summary of findings");
    }

    #[test]
    fn test_user_constructor() {
        let content = Content::user("hello");
        assert_eq!(content.role, "user");
        assert_eq!(content.text(), "hello");
    }
}
