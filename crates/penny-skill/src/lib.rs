// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tools the model can call.
//!
//! [`Tool`] is the capability interface, [`ToolRegistry`] indexes tools by
//! name and produces the schemas advertised to the model, and
//! [`ToolExecutor`] runs a requested call and normalizes whatever happens
//! into a [`ToolResult`](penny_core::types::ToolResult).

pub mod builtin;
pub mod executor;
pub mod tool;

pub use executor::ToolExecutor;
pub use tool::{Tool, ToolRegistry};
