use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a message in the mail store. Lower ids are older messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u32);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of email being composed. Decides whether original context is fetched
/// and which generation endpoint is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailType {
    New,
    #[default]
    Reply,
    Thread,
}

impl EmailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailType::New => "new",
            EmailType::Reply => "reply",
            EmailType::Thread => "thread",
        }
    }

    /// Reply and thread generation both work from an existing message
    pub fn uses_context(&self) -> bool {
        !matches!(self, EmailType::New)
    }
}

impl fmt::Display for EmailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EmailType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "new" => Ok(EmailType::New),
            "reply" => Ok(EmailType::Reply),
            "thread" => Ok(EmailType::Thread),
            other => Err(format!("Unknown email type: {}", other)),
        }
    }
}

/// Snapshot of the compose window, as handed over by the host compose surface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeDraft {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub plain_text_body: String,
    /// HTML body
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub related_message_id: Option<MessageId>,
}

/// The message being replied to, or the rendered thread
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginalMessage {
    pub subject: String,
    pub body: String,
}

/// One MIME part as listed by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePart {
    pub content_type: String,
    pub part_id: String,
}

impl MessagePart {
    pub fn is_plain_text(&self) -> bool {
        self.content_type.eq_ignore_ascii_case("text/plain")
    }

    pub fn is_html(&self) -> bool {
        self.content_type.eq_ignore_ascii_case("text/html")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FullMessage {
    pub parts: Vec<MessagePart>,
}

/// Header-level view of a stored message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub id: MessageId,
    pub subject: String,
    pub folder: String,
    pub thread_id: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineTextPart {
    pub part_id: String,
    pub content: String,
}

/// Final document handed back to the compose surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedCompose {
    pub body: String,
    pub is_plain_text: bool,
}
