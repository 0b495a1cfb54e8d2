// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable-queue alert ingestion for Chatsight.
//!
//! Consumes one durable queue per alert kind with manual acknowledgment:
//! validated events become rows in the append-only alert log, malformed
//! payloads are acked and dropped, and store failures are nacked back onto
//! the queue for redelivery.

pub mod consumer;
pub mod envelope;

pub use consumer::{AlertConsumer, DeliveryOutcome};
pub use envelope::{AlertEnvelope, AlertEvent, AlertPayload, MissingFields};
