// SPDX-License-Identifier: MIT

//! Runtime state threaded through the research workflow

use serde::{Deserialize, Serialize};

/// State of one workflow invocation
///
/// `messages` uses an append reducer and `result` an overwrite reducer;
/// steps never mutate the state directly, they return a [`StateUpdate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub query: String,
    pub messages: Vec<String>,
    pub result: String,
}

/// Partial output of a single step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub messages: Vec<String>,
    pub result: Option<String>,
}

impl WorkflowState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            messages: Vec::new(),
            result: String::new(),
        }
    }

    /// Merge a step's update into a new state
    pub fn merge(mut self, update: StateUpdate) -> Self {
        self.messages.extend(update.messages);
        if let Some(result) = update.result {
            if !self.result.is_empty() {
                log::warn!("Overwriting existing workflow result");
            }
            self.result = result;
        }
        self
    }
}

impl StateUpdate {
    /// Update appending one message
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            messages: vec![text.into()],
            result: None,
        }
    }

    /// Update appending `text` and setting it as the result
    pub fn result(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            messages: vec![text.clone()],
            result: Some(text),
        }
    }
}
