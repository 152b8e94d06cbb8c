// SPDX-License-Identifier: MIT

//! Fixed four-step research workflow
//!
//! `start -> memory_search -> research_execution -> end`, run strictly in
//! order with no branching. Any collaborator error aborts the invocation.

use super::state::{StateUpdate, WorkflowState};
use crate::adk::error::Result;
use crate::adk::model::{Content, GenerationConfig, Model};
use crate::researcher::format::{format_recall, format_search};
use crate::researcher::prompt::{arxiv_search_query, build_report_prompt, memory_lookup_query};
use crate::researcher::search::SearchProvider;
use crate::researcher::store::{ChatHistory, Role, StoredMessage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const START_MARKER: &str = "Research started.";
pub const END_MARKER: &str = "Process completed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Start,
    MemorySearch,
    ResearchExecution,
    End,
}

impl Step {
    /// Execution order
    pub const SEQUENCE: [Step; 4] = [
        Step::Start,
        Step::MemorySearch,
        Step::ResearchExecution,
        Step::End,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::Start => "start",
            Step::MemorySearch => "memory_search",
            Step::ResearchExecution => "research_execution",
            Step::End => "end",
        }
    }
}

/// Progress notifications emitted while a workflow runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkflowEvent {
    StepStarted(Step),
    StepCompleted { step: Step, appended: usize },
    Failed { step: Step, error: String },
}

pub struct ResearchWorkflow {
    model: Arc<dyn Model>,
    search: Arc<dyn SearchProvider>,
    history: Arc<dyn ChatHistory>,
    generation: Option<GenerationConfig>,
}

impl ResearchWorkflow {
    pub fn new(
        model: Arc<dyn Model>,
        search: Arc<dyn SearchProvider>,
        history: Arc<dyn ChatHistory>,
    ) -> Self {
        Self {
            model,
            search,
            history,
            generation: None,
        }
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation = Some(config);
        self
    }

    /// Run the full pipeline and return the terminal state
    pub async fn run(&self, query: &str) -> Result<WorkflowState> {
        self.execute(query, None).await
    }

    /// Same as [`run`](Self::run), reporting progress on `tx`
    pub async fn run_stream(
        &self,
        query: &str,
        tx: mpsc::Sender<WorkflowEvent>,
    ) -> Result<WorkflowState> {
        self.execute(query, Some(&tx)).await
    }

    async fn execute(
        &self,
        query: &str,
        tx: Option<&mpsc::Sender<WorkflowEvent>>,
    ) -> Result<WorkflowState> {
        log::info!("Starting research workflow for: {}", query);
        let mut state = WorkflowState::new(query);

        for step in Step::SEQUENCE {
            log::info!("Running step: {}", step.name());
            notify(tx, WorkflowEvent::StepStarted(step)).await;

            let update = match self.execute_step(step, &state).await {
                Ok(update) => update,
                Err(e) => {
                    log::error!("Step {} failed: {}", step.name(), e);
                    notify(
                        tx,
                        WorkflowEvent::Failed {
                            step,
                            error: e.to_string(),
                        },
                    )
                    .await;
                    return Err(e);
                }
            };

            let appended = update.messages.len();
            state = state.merge(update);
            notify(tx, WorkflowEvent::StepCompleted { step, appended }).await;
        }

        log::info!("Research workflow completed for: {}", query);
        Ok(state)
    }

    async fn execute_step(&self, step: Step, state: &WorkflowState) -> Result<StateUpdate> {
        match step {
            Step::Start => Ok(StateUpdate::message(START_MARKER)),
            Step::MemorySearch => {
                let digest = self.recall(&memory_lookup_query(&state.query)).await?;
                Ok(StateUpdate::message(digest))
            }
            Step::ResearchExecution => {
                let report = self.research(&state.query).await?;
                Ok(StateUpdate::result(report))
            }
            Step::End => Ok(StateUpdate::message(END_MARKER)),
        }
    }

    /// Digest of stored history matching `query`
    pub async fn recall(&self, query: &str) -> Result<String> {
        let messages = self.history.messages().await?;
        Ok(format_recall(query, &messages))
    }

    /// Digest of search results for a research topic
    pub async fn search_papers(&self, topic: &str) -> Result<String> {
        let results = self.search.search(&arxiv_search_query(topic)).await?;
        Ok(format_search(topic, &results))
    }

    /// Fresh recall + search, one model call, report persisted to history
    async fn research(&self, query: &str) -> Result<String> {
        let memory_digest = self.recall(query).await?;
        let search_digest = self.search_papers(query).await?;
        let prompt = build_report_prompt(query, &memory_digest, &search_digest);

        let response = self
            .model
            .generate_content(&[Content::user(prompt)], self.generation.as_ref())
            .await?;
        let report = response.text();
        log::info!("Model returned report ({} chars)", report.chars().count());

        self.history
            .add_message(StoredMessage::new(Role::Ai, report.clone()))
            .await?;

        Ok(report)
    }
}

async fn notify(tx: Option<&mpsc::Sender<WorkflowEvent>>, event: WorkflowEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event).await;
    }
}
