// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama inference client for Chatsight conversation analysis.
//!
//! Wraps a local Ollama-compatible chat endpoint: fixed sampling
//! parameters, non-streaming JSON-formatted output, a hard per-call
//! timeout, and best-effort JSON extraction from the raw reply.

pub mod client;
pub mod parse;
pub mod types;

pub use client::OllamaClient;
pub use parse::extract_json;
