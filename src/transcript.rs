//! Conversation reconstruction.
//!
//! The consultation log is append-only: messages may arrive out of order and
//! assistant turns may have been retried, leaving several responses to one
//! question. `reconstruct_exchanges` rebuilds the displayable conversation
//! from scratch on every call - no incremental state, no caches - so its
//! output depends only on its inputs.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{Exchange, Message, MessageRole, Output};

/// Group a message log into ordered exchanges.
///
/// Messages are ordered by creation time (stable for ties); each user message
/// opens an exchange, and of the assistant messages that follow before the
/// next user message only the latest is kept. Superseded retries stay in the
/// caller's log untouched - they are soft-deleted for display only. The kept
/// assistant's output reference is resolved against `outputs`; an unresolved
/// reference leaves the output empty rather than failing.
pub fn reconstruct_exchanges(messages: &[Message], outputs: &[Output]) -> Vec<Exchange> {
    let mut ordered: Vec<&Message> = messages.iter().collect();
    ordered.sort_by_key(|message| message.created_at);

    let outputs_by_id: HashMap<&str, &Output> = outputs
        .iter()
        .map(|output| (output.id.as_str(), output))
        .collect();

    let mut exchanges: Vec<Exchange> = Vec::new();
    for message in ordered {
        match message.role {
            MessageRole::User => {
                exchanges.push(Exchange {
                    user: message.clone(),
                    assistant: None,
                    output: None,
                });
            }
            MessageRole::Assistant => {
                if let Some(open) = exchanges.last_mut() {
                    // Latest retry wins; ties go to the later log position.
                    let supersedes = open
                        .assistant
                        .as_ref()
                        .map(|kept| message.created_at >= kept.created_at)
                        .unwrap_or(true);
                    if supersedes {
                        open.assistant = Some(message.clone());
                    }
                } else {
                    debug!(message_id = %message.id, "assistant message precedes any user message, skipping");
                }
            }
        }
    }

    for exchange in &mut exchanges {
        let output_id = exchange
            .assistant
            .as_ref()
            .and_then(|assistant| assistant.output_id.as_deref());
        if let Some(output_id) = output_id {
            match outputs_by_id.get(output_id) {
                Some(output) => exchange.output = Some((*output).clone()),
                None => {
                    debug!(output_id, "assistant references an unknown output, leaving it empty");
                }
            }
        }
    }

    exchanges
}
