// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential provider trait for outbound authenticated calls.

use async_trait::async_trait;

use crate::error::ChatsightError;

/// Supplies the bearer token for upstream API calls.
///
/// Injected into the project resolver rather than read from ambient state.
/// Implementations own their refresh lifecycle: a call must return a token
/// that is valid now, fetching or refreshing as needed.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String, ChatsightError>;
}
