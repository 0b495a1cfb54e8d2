// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Chatsight pipelines.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility:
//! the orchestrator and consumer hold `Arc<dyn ...>` handles so tests can
//! substitute in-memory or mock implementations.

pub mod auth;
pub mod inference;
pub mod resolver;
pub mod store;

pub use auth::TokenProvider;
pub use inference::InferenceProvider;
pub use resolver::ProjectResolver;
pub use store::StoreAdapter;
