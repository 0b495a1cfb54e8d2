// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Project-configuration resolver for Chatsight.
//!
//! Resolves the external project configuration that drives a
//! conversation's analysis, authenticating with a bearer token supplied by
//! an injected credential provider with its own refresh lifecycle.

pub mod auth;
pub mod client;

pub use auth::{token_provider_from_config, RefreshingToken, StaticToken};
pub use client::{ProjectsClient, ProjectResponse};
