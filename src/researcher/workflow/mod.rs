// SPDX-License-Identifier: MIT

//! Research workflow
//!
//! This module provides:
//! - `WorkflowState` - state threaded through the steps
//! - `StateUpdate` - partial output merged by the engine
//! - `ResearchWorkflow` - the fixed four-step pipeline

mod engine;
mod state;

pub use engine::{ResearchWorkflow, Step, WorkflowEvent, END_MARKER, START_MARKER};
pub use state::{StateUpdate, WorkflowState};
