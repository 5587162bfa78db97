//! # Conversation Grounding
//!
//! Prepends a system message with a snapshot of sandbox files when the latest
//! user message looks file-related.

use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::domain::config::ContextLimits;
use crate::domain::session::Session;
use crate::infrastructure::llm::ChatMessage;
use crate::infrastructure::tools::ContextCollector;
use crate::strings::{logs, prompts};

fn file_intent() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)file|read|write|edit|create|folder|directory|task|project|config|wiki|logic|skill")
            .expect("file intent pattern is valid")
    })
}

/// True when `text` mentions anything the sandbox could help with.
pub fn needs_file_context(text: &str) -> bool {
    file_intent().is_match(text)
}

/// Returns `history`, prefixed with a grounding system message when the most
/// recent user message needs file context and the sandbox has files.
pub async fn with_file_context(
    collector: &ContextCollector,
    session: &Session,
    history: &[ChatMessage],
    limits: ContextLimits,
) -> Vec<ChatMessage> {
    let last_user = history.iter().rev().find_map(|m| match m {
        ChatMessage::User { content } => Some(content.as_str()),
        _ => None,
    });

    let Some(text) = last_user else {
        return history.to_vec();
    };
    if !needs_file_context(text) {
        debug!("latest user message does not need file context");
        return history.to_vec();
    }

    let collected = collector.collect(session, limits.max_files, limits.max_depth).await;
    if collected.is_empty() {
        return history.to_vec();
    }
    info!("{}", logs::context_injected(collected.len(), collected.skipped));

    let formatted = ContextCollector::format_for_model(&collected.files);
    let mut grounded = Vec::with_capacity(history.len() + 1);
    grounded.push(ChatMessage::system(prompts::file_context_system(&formatted)));
    grounded.extend_from_slice(history);
    grounded
}
