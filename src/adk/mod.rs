// SPDX-License-Identifier: MIT

//! Collaborator kit: the language-model abstraction and the crate error type.

pub mod error;
pub mod model;
