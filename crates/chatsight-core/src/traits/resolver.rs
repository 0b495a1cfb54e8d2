// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Project configuration resolver trait.

use async_trait::async_trait;

use crate::error::ChatsightError;
use crate::types::ProjectConfig;

/// Resolves the external project configuration driving a conversation's
/// analysis. Always fetched fresh; implementations must not cache.
#[async_trait]
pub trait ProjectResolver: Send + Sync {
    async fn project_config(&self, project_id: &str) -> Result<ProjectConfig, ChatsightError>;
}
