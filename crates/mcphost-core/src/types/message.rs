//! Chat message and conversation turn types

use serde::{Deserialize, Serialize};

/// Message role in a conversation
///
/// `Tool` only ever arrives through caller-supplied history (some front-ends
/// record tool traffic as its own role); it is never sent to a model backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    /// Whether messages with this role are forwarded to a model backend
    pub fn is_conversational(&self) -> bool {
        matches!(self, MessageRole::System | MessageRole::User | MessageRole::Assistant)
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// A chat message for model requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender
    pub role: MessageRole,
    /// The text content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Display annotations attached to a turn
///
/// Front-ends use these to group raw tool output under the answer it fed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Name of the tool whose raw output this turn carries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl TurnMetadata {
    /// Metadata marking a turn as the raw output of `tool_name`
    pub fn tool_output(tool_name: &str) -> Self {
        Self {
            id: Some(format!("raw_result_{tool_name}")),
            parent_id: Some(format!("result_{tool_name}")),
            title: Some("Raw Output".to_string()),
            tool: Some(tool_name.to_string()),
        }
    }
}

/// One message in a conversation, as exchanged with the caller
///
/// Turns are immutable once produced; history is owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TurnMetadata>,
}

impl ConversationTurn {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            metadata: None,
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            metadata: None,
        }
    }

    /// Create a system turn
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
            metadata: None,
        }
    }

    /// Create the assistant turn that carries a tool's raw output
    pub fn tool_output(tool_name: &str, raw_output: &str) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: fenced(raw_output),
            metadata: Some(TurnMetadata::tool_output(tool_name)),
        }
    }

    /// Whether this turn is tagged as raw tool output
    pub fn is_tool_output(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.tool.is_some())
    }

    /// The model-facing view of this turn, if its role is forwarded
    pub fn to_chat_message(&self) -> Option<ChatMessage> {
        self.role.is_conversational().then(|| ChatMessage {
            role: self.role,
            content: self.content.clone(),
        })
    }
}

/// Wrap `text` in a code fence longer than any backtick run inside it
fn fenced(text: &str) -> String {
    let longest_run = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run.max(2) + 1);
    format!("{fence}\n{text}\n{fence}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_creation() {
        let sys = ChatMessage::system("You are helpful");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.content, "You are helpful");

        let user = ChatMessage::user("Hello");
        assert_eq!(user.role, MessageRole::User);

        let asst = ChatMessage::assistant("Hi there!");
        assert_eq!(asst.role, MessageRole::Assistant);
    }

    #[test]
    fn test_tool_output_turn_is_tagged() {
        let turn = ConversationTurn::tool_output("get_time", "2024-01-01T00:00:00");
        assert_eq!(turn.role, MessageRole::Assistant);
        assert!(turn.is_tool_output());
        assert!(turn.content.contains("2024-01-01T00:00:00"));

        let meta = turn.metadata.unwrap();
        assert_eq!(meta.id.as_deref(), Some("raw_result_get_time"));
        assert_eq!(meta.parent_id.as_deref(), Some("result_get_time"));
        assert_eq!(meta.title.as_deref(), Some("Raw Output"));
    }

    #[test]
    fn test_tool_role_is_not_forwarded() {
        let turn = ConversationTurn {
            role: MessageRole::Tool,
            content: "{}".to_string(),
            metadata: None,
        };
        assert!(turn.to_chat_message().is_none());
        assert!(ConversationTurn::user("hi").to_chat_message().is_some());
    }

    #[test]
    fn test_turn_deserialization_from_front_end() {
        let json = r#"{"role":"assistant","content":"ok","metadata":{"title":"Raw Output","tool":"echo"}}"#;
        let turn: ConversationTurn = serde_json::from_str(json).unwrap();
        assert!(turn.is_tool_output());

        let plain: ConversationTurn = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
        assert!(plain.metadata.is_none());
    }

    #[test]
    fn test_tool_output_fence_outgrows_embedded_fences() {
        let plain = ConversationTurn::tool_output("get_time", "noon");
        assert_eq!(plain.content, "```\nnoon\n```");

        let raw = "README:\n```rust\nfn main() {}\n```";
        let turn = ConversationTurn::tool_output("read_file", raw);
        assert_eq!(turn.content, format!("````\n{raw}\n````"));
        assert!(turn.content.lines().next().unwrap().len() > 3);
    }
}
