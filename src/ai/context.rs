//! Original-message context for reply and thread generation

use crate::mail::parser::html_to_text;
use crate::mail::{EmailType, MailStore, MessageHeader, MessageId, OriginalMessage, StoreError};

/// Gather the original message (or rendered thread) for a generation request.
///
/// Returns `None` for new emails, when no message is linked, or when the store
/// fails. Store errors are logged and swallowed: a prompt without context is
/// still worth sending.
pub async fn extract_context<S: MailStore>(
    store: &S,
    message_id: Option<MessageId>,
    email_type: EmailType,
) -> Option<OriginalMessage> {
    let id = message_id?;
    if !email_type.uses_context() {
        return None;
    }

    match fetch_context(store, id, email_type).await {
        Ok(original) => Some(original),
        Err(e) => {
            tracing::warn!("Could not fetch original message {}: {}", id, e);
            None
        }
    }
}

async fn fetch_context<S: MailStore>(
    store: &S,
    id: MessageId,
    email_type: EmailType,
) -> Result<OriginalMessage, StoreError> {
    let full = store.get_full_message(id).await?;
    let subject = store.get_message(id).await?.subject;

    // Plain text wins over HTML regardless of part order
    let text_part = full
        .parts
        .iter()
        .find(|p| p.is_plain_text())
        .or_else(|| full.parts.iter().find(|p| p.is_html()));

    let body = match text_part {
        Some(part) => {
            let content = store
                .list_inline_text_parts(id, std::slice::from_ref(&part.part_id))
                .await?
                .into_iter()
                .next()
                .map(|p| p.content)
                .unwrap_or_default();
            if part.is_html() {
                html_to_text(&content)
            } else {
                content
            }
        }
        None => String::new(),
    };

    if email_type != EmailType::Thread {
        return Ok(OriginalMessage { subject, body });
    }

    let header = store.get_message(id).await?;
    let thread = store
        .list_thread_messages(&header.folder, &header.thread_id)
        .await?;
    tracing::debug!(
        "Thread {} has {} messages",
        header.thread_id,
        thread.len()
    );

    Ok(OriginalMessage {
        subject,
        body: render_thread(&thread),
    })
}

/// Render thread messages in the order given, one `Subject:`/`Body:` block each
pub fn render_thread(messages: &[MessageHeader]) -> String {
    messages
        .iter()
        .map(|m| format!("Subject: {}\nBody: {}", m.subject, m.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}
