pub mod eml;
pub mod parser;
pub mod store;
pub mod types;

pub use eml::EmlStore;
pub use store::{MailStore, MemoryStore, StoreError, StoredMessage};
pub use types::{
    ComposeDraft, EmailType, FullMessage, InlineTextPart, MergedCompose, MessageHeader,
    MessageId, MessagePart, OriginalMessage,
};
