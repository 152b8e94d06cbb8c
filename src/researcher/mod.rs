// SPDX-License-Identifier: MIT

pub mod config;
pub mod format;
pub mod prompt;
pub mod search;
pub mod store;
pub mod workflow;
