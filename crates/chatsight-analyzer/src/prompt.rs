// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt construction for conversation analysis.
//!
//! Pure and deterministic: identical inputs always produce byte-identical
//! prompt text. No timestamps, no random tokens, and the project fields
//! render in a stable order (BTreeMap iteration).

use chatsight_core::{ChatMessage, ProjectConfig};

/// Placeholder rendered for messages with no text body.
const EMPTY_BODY_PLACEHOLDER: &str = "[Media or empty message]";

/// Build the analysis prompt from a project configuration and a
/// chronological transcript.
///
/// Layout: role preamble, optional description/domain, numbered
/// instructions, bullet field list, serialized output format, serialized
/// example analyses, the transcript as `[Role: body]` lines, and a closing
/// instruction to return only a JSON object.
pub fn build_prompt(config: &ProjectConfig, transcript: &[ChatMessage]) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "You are a conversation analyst for the project \"{}\". \
         Your task is to extract structured business data from the \
         conversation below between a customer and an agent.\n",
        config.name
    ));
    if let Some(description) = &config.description {
        prompt.push_str(&format!("Project description: {description}\n"));
    }
    if let Some(domain) = &config.domain {
        prompt.push_str(&format!("Business domain: {domain}\n"));
    }
    prompt.push('\n');

    if !config.instructions.is_empty() {
        prompt.push_str("Instructions:\n");
        for (i, instruction) in config.instructions.iter().enumerate() {
            prompt.push_str(&format!("{}. {instruction}\n", i + 1));
        }
        prompt.push('\n');
    }

    if !config.fields.is_empty() {
        prompt.push_str("Fields to extract:\n");
        for (name, description) in &config.fields {
            prompt.push_str(&format!("- {name}: {description}\n"));
        }
        prompt.push('\n');
    }

    if !config.output_format.is_null() {
        prompt.push_str("Output format:\n");
        prompt.push_str(&config.output_format.to_string());
        prompt.push_str("\n\n");
    }

    if !config.example_analysis.is_empty() {
        prompt.push_str("Example analyses:\n");
        for example in &config.example_analysis {
            prompt.push_str(&example.to_string());
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    prompt.push_str("Conversation:\n");
    for message in transcript {
        let role = if message.from_me { "Agent" } else { "Customer" };
        let body = message
            .body
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or(EMPTY_BODY_PLACEHOLDER);
        prompt.push_str(&format!("[{role}: {body}]\n"));
    }

    prompt.push_str(
        "\nReturn only a JSON object matching the output format above. \
         Do not wrap it in markdown and do not add any text outside the object.\n",
    );

    prompt
}
