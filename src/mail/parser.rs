use mail_parser::{MessageParser, MimeHeaders, PartType};

use super::types::MessagePart;
use crate::constants::{HTML_TEXT_WIDTH, SNIPPET_LENGTH};

/// A raw message broken down into what the store serves
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    pub subject: String,
    pub message_id: Option<String>,
    /// Root of the reply chain this message belongs to, if headers name one
    pub thread_root: Option<String>,
    pub snippet: String,
    /// Parts with their decoded content
    pub parts: Vec<(MessagePart, String)>,
}

/// Convert HTML to readable plain text
pub fn html_to_text(html: &str) -> String {
    html2text::config::plain()
        .string_from_read(html.as_bytes(), HTML_TEXT_WIDTH)
        .unwrap_or_else(|e| {
            tracing::debug!("HTML to text conversion failed: {}", e);
            html.to_string()
        })
}

pub fn parse_message(raw: &[u8]) -> Option<ParsedMessage> {
    let message = MessageParser::default().parse(raw)?;

    let subject = message.subject().map(|s| s.to_string()).unwrap_or_default();
    let message_id = message.message_id().map(|s| s.to_string());

    let first_reference = message
        .references()
        .as_text_list()
        .and_then(|ids| ids.first().map(|s| s.to_string()));
    let in_reply_to = message
        .in_reply_to()
        .as_text_list()
        .and_then(|ids| ids.first().map(|s| s.to_string()));
    let thread_root = first_reference.or(in_reply_to).or_else(|| message_id.clone());

    let parts = message
        .parts
        .iter()
        .enumerate()
        .filter_map(|(index, part)| {
            let content = match &part.body {
                PartType::Text(text) => text.to_string(),
                PartType::Html(html) => html.to_string(),
                _ => return None,
            };
            let content_type = match part.content_type() {
                Some(ct) => match ct.subtype() {
                    Some(sub) => format!("{}/{}", ct.ctype(), sub),
                    None => ct.ctype().to_string(),
                },
                None if matches!(part.body, PartType::Html(_)) => "text/html".to_string(),
                None => "text/plain".to_string(),
            };
            Some((
                MessagePart {
                    content_type: content_type.to_ascii_lowercase(),
                    part_id: (index + 1).to_string(),
                },
                content,
            ))
        })
        .collect::<Vec<_>>();

    let snippet = extract_snippet(&parts, SNIPPET_LENGTH);

    Some(ParsedMessage {
        subject,
        message_id,
        thread_root,
        snippet,
        parts,
    })
}

fn extract_snippet(parts: &[(MessagePart, String)], max_len: usize) -> String {
    let text = parts
        .iter()
        .find(|(part, _)| part.is_plain_text())
        .map(|(_, content)| content.clone())
        .or_else(|| {
            parts
                .iter()
                .find(|(part, _)| part.is_html())
                .map(|(_, content)| html_to_text(content))
        })
        .unwrap_or_default();

    let snippet: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .take(max_len)
        .collect();

    snippet.split_whitespace().collect::<Vec<_>>().join(" ")
}
