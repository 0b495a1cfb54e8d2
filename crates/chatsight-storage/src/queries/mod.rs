// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod alerts;
pub mod chats;
pub mod messages;
pub mod queue;
pub mod sessions;
