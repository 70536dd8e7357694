//! Mail store abstraction consumed by the context extractor.

use std::future::Future;
use thiserror::Error;

use super::types::{FullMessage, InlineTextPart, MessageHeader, MessageId, MessagePart};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("message {0} not found")]
    NotFound(MessageId),
    #[error("mail store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to parse message {0}")]
    Parse(MessageId),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Read access to stored messages.
///
/// Thread listings are returned in store order (oldest first); callers must
/// not rely on any other ordering.
pub trait MailStore: Send + Sync {
    fn get_full_message(
        &self,
        id: MessageId,
    ) -> impl Future<Output = Result<FullMessage, StoreError>> + Send;

    fn get_message(
        &self,
        id: MessageId,
    ) -> impl Future<Output = Result<MessageHeader, StoreError>> + Send;

    fn list_thread_messages(
        &self,
        folder: &str,
        thread_id: &str,
    ) -> impl Future<Output = Result<Vec<MessageHeader>, StoreError>> + Send;

    fn list_inline_text_parts(
        &self,
        id: MessageId,
        part_ids: &[String],
    ) -> impl Future<Output = Result<Vec<InlineTextPart>, StoreError>> + Send;
}

/// A message held by [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub header: MessageHeader,
    /// Parts with their decoded content
    pub parts: Vec<(MessagePart, String)>,
}

/// In-memory store. Messages are listed in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    messages: Vec<StoredMessage>,
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: StoredMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Make every call fail with [`StoreError::Unavailable`]
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    fn find(&self, id: MessageId) -> Result<&StoredMessage, StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        self.messages
            .iter()
            .find(|m| m.header.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}

impl MailStore for MemoryStore {
    async fn get_full_message(&self, id: MessageId) -> Result<FullMessage, StoreError> {
        let message = self.find(id)?;
        Ok(FullMessage {
            parts: message.parts.iter().map(|(part, _)| part.clone()).collect(),
        })
    }

    async fn get_message(&self, id: MessageId) -> Result<MessageHeader, StoreError> {
        Ok(self.find(id)?.header.clone())
    }

    async fn list_thread_messages(
        &self,
        folder: &str,
        thread_id: &str,
    ) -> Result<Vec<MessageHeader>, StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(self
            .messages
            .iter()
            .filter(|m| m.header.folder == folder && m.header.thread_id == thread_id)
            .map(|m| m.header.clone())
            .collect())
    }

    async fn list_inline_text_parts(
        &self,
        id: MessageId,
        part_ids: &[String],
    ) -> Result<Vec<InlineTextPart>, StoreError> {
        let message = self.find(id)?;
        Ok(message
            .parts
            .iter()
            .filter(|(part, _)| part_ids.contains(&part.part_id))
            .map(|(part, content)| InlineTextPart {
                part_id: part.part_id.clone(),
                content: content.clone(),
            })
            .collect())
    }
}
