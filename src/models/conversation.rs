use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message in a consultation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message record from the consultation log.
///
/// The log is append-only and may contain retried assistant attempts; display
/// grouping is handled by [`crate::transcript::reconstruct_exchanges`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub output_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Structured guidance produced for an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub id: String,
    pub conversation_id: String,
    /// Opaque guidance payload; rendering is the application's concern.
    pub result: serde_json::Value,
    /// Model confidence in the guidance, 0 to 1.
    pub confidence: f64,
    #[serde(default)]
    pub scholar_reviewed: bool,
    pub created_at: DateTime<Utc>,
}

/// One turn of a consultation as displayed: the user's question, the latest
/// assistant response if any, and the output it references if resolvable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub user: Message,
    pub assistant: Option<Message>,
    pub output: Option<Output>,
}

impl Exchange {
    /// A turn with no assistant response yet (pending or abandoned).
    pub fn is_pending(&self) -> bool {
        self.assistant.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_message_without_output_reference() {
        let json = r#"{
            "id": "msg_1",
            "conversation_id": "conv_1",
            "role": "user",
            "content": "May I break a promise to keep a confidence?",
            "created_at": "2026-03-01T10:00:00Z"
        }"#;

        let message: Message = serde_json::from_str(json).expect("message should parse");
        assert_eq!(message.role, MessageRole::User);
        assert!(message.output_id.is_none());
    }

    #[test]
    fn parses_output_with_opaque_result() {
        let json = r#"{
            "id": "out_1",
            "conversation_id": "conv_1",
            "result": {"summary": "Weigh the harms.", "sources": []},
            "confidence": 0.82,
            "scholar_reviewed": true,
            "created_at": "2026-03-01T10:00:05Z"
        }"#;

        let output: Output = serde_json::from_str(json).expect("output should parse");
        assert!(output.scholar_reviewed);
        assert_eq!(output.result["summary"], "Weigh the harms.");
    }
}
