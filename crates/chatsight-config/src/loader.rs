// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./chatsight.toml` > `~/.config/chatsight/chatsight.toml`
//! > `/etc/chatsight/chatsight.toml` with environment variable overrides via
//! the `CHATSIGHT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ChatsightConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/chatsight/chatsight.toml` (system-wide)
/// 3. `~/.config/chatsight/chatsight.toml` (user XDG config)
/// 4. `./chatsight.toml` (local directory)
/// 5. `CHATSIGHT_*` environment variables
pub fn load_config() -> Result<ChatsightConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatsightConfig::default()))
        .merge(Toml::file("/etc/chatsight/chatsight.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("chatsight/chatsight.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("chatsight.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<ChatsightConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatsightConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ChatsightConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatsightConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `CHATSIGHT_STORAGE_DATABASE_PATH` must
/// map to `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("CHATSIGHT_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: CHATSIGHT_INFERENCE_TIMEOUT_MS -> "inference_timeout_ms"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("log_", "log.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("inference_", "inference.", 1)
            .replacen("analysis_", "analysis.", 1)
            .replacen("ingest_", "ingest.", 1)
            .replacen("projects_", "projects.", 1)
            .replacen("session_", "session.", 1);
        mapped.into()
    })
}
