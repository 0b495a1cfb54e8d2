// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the project-configuration service.
//!
//! Every analysis resolves its project configuration fresh; nothing is
//! cached here so instruction or field changes upstream take effect on the
//! very next pass.

use std::sync::Arc;

use async_trait::async_trait;
use chatsight_config::model::ProjectsConfig;
use chatsight_core::{ChatsightError, ProjectConfig, ProjectResolver, TokenProvider};
use serde::Deserialize;
use tracing::debug;

/// Wire shape of `GET /groups/{project_id}/project`.
#[derive(Debug, Deserialize)]
pub struct ProjectResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub config: ProjectConfig,
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<String>,
}

/// Client for the project-configuration service.
pub struct ProjectsClient {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl ProjectsClient {
    /// Creates a new client with the injected credential provider.
    pub fn new(
        config: &ProjectsConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, ChatsightError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ChatsightError::Resolver {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }
}

#[async_trait]
impl ProjectResolver for ProjectsClient {
    async fn project_config(&self, project_id: &str) -> Result<ProjectConfig, ChatsightError> {
        let token = self.tokens.bearer_token().await?;
        let url = format!("{}/groups/{project_id}/project", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ChatsightError::Resolver {
                message: format!("project request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, project_id, "project configuration fetched");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatsightError::Resolver {
                message: format!("project service returned {status}: {body}"),
                source: None,
            });
        }

        let project: ProjectResponse =
            response.json().await.map_err(|e| ChatsightError::Resolver {
                message: format!("failed to parse project response: {e}"),
                source: Some(Box::new(e)),
            })?;

        if project.deleted {
            return Err(ChatsightError::Resolver {
                message: format!("project {project_id} is deleted"),
                source: None,
            });
        }

        Ok(project.config)
    }
}
