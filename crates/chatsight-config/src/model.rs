// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Chatsight service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. Every tunable the pipelines consume lives here;
//! the defaults are documented on the fields and nothing is hardwired
//! elsewhere.

use serde::{Deserialize, Serialize};

/// Top-level Chatsight configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatsightConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Local inference endpoint settings.
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Scheduled conversation-analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Alert queue consumer settings.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Upstream project-configuration service settings.
    #[serde(default)]
    pub projects: ProjectsConfig,

    /// Session lifecycle settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("chatsight").join("chatsight.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "chatsight.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Local inference endpoint configuration.
///
/// The endpoint speaks the Ollama chat protocol. Sampling parameters are
/// fixed per deployment; the orchestrator never varies them per call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InferenceConfig {
    /// Base URL of the inference endpoint.
    #[serde(default = "default_inference_host")]
    pub host: String,

    /// Model name to request.
    #[serde(default = "default_inference_model")]
    pub model: String,

    /// Hard timeout for one inference call, in milliseconds.
    #[serde(default = "default_inference_timeout_ms")]
    pub timeout_ms: u64,

    /// Context window size passed to the model.
    #[serde(default = "default_num_ctx")]
    pub num_ctx: u32,

    /// Maximum output tokens per reply.
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_top_p")]
    pub top_p: f64,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// CPU threads the endpoint should use for this request.
    #[serde(default = "default_num_thread")]
    pub num_thread: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            host: default_inference_host(),
            model: default_inference_model(),
            timeout_ms: default_inference_timeout_ms(),
            num_ctx: default_num_ctx(),
            num_predict: default_num_predict(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            num_thread: default_num_thread(),
        }
    }
}

fn default_inference_host() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_inference_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_inference_timeout_ms() -> u64 {
    60_000
}

fn default_num_ctx() -> u32 {
    4096
}

fn default_num_predict() -> u32 {
    1024
}

fn default_temperature() -> f64 {
    0.2
}

fn default_top_p() -> f64 {
    0.9
}

fn default_top_k() -> u32 {
    40
}

fn default_num_thread() -> u32 {
    4
}

/// Scheduled conversation-analysis configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Seconds between scheduling passes.
    #[serde(default = "default_analysis_interval_secs")]
    pub interval_secs: u64,

    /// Maximum candidates selected per pass.
    #[serde(default = "default_analysis_batch_size")]
    pub batch_size: i64,

    /// Concurrent analyses within one pass. The only backpressure
    /// protecting the inference endpoint.
    #[serde(default = "default_analysis_concurrency")]
    pub concurrency: usize,

    /// Maximum messages included in one prompt.
    #[serde(default = "default_max_messages")]
    pub max_messages: i64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_analysis_interval_secs(),
            batch_size: default_analysis_batch_size(),
            concurrency: default_analysis_concurrency(),
            max_messages: default_max_messages(),
        }
    }
}

fn default_analysis_interval_secs() -> u64 {
    600
}

fn default_analysis_batch_size() -> i64 {
    30
}

fn default_analysis_concurrency() -> usize {
    2
}

fn default_max_messages() -> i64 {
    50
}

/// Alert queue consumer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Milliseconds between polls of an empty queue.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Seconds a dequeued entry stays locked before it is redelivered.
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            lock_timeout_secs: default_lock_timeout_secs(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_lock_timeout_secs() -> u64 {
    300
}

/// Upstream project-configuration service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectsConfig {
    /// Base URL of the project-configuration service.
    #[serde(default = "default_projects_base_url")]
    pub base_url: String,

    /// Static bearer token. When set, no refresh lifecycle runs.
    #[serde(default)]
    pub token: Option<String>,

    /// Token endpoint for the refreshing credential provider.
    #[serde(default)]
    pub auth_url: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    /// Seconds before expiry at which a cached token counts as stale.
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: u64,
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        Self {
            base_url: default_projects_base_url(),
            token: None,
            auth_url: None,
            client_id: None,
            client_secret: None,
            refresh_margin_secs: default_refresh_margin_secs(),
        }
    }
}

fn default_projects_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_refresh_margin_secs() -> u64 {
    60
}

/// Session lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Maximum QR generation attempts before a session errors out.
    #[serde(default = "default_max_qr_attempts")]
    pub max_qr_attempts: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_qr_attempts: default_max_qr_attempts(),
        }
    }
}

fn default_max_qr_attempts() -> i64 {
    5
}
