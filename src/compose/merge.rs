//! Splicing a generated reply into an existing HTML compose body

use super::extract::{BodyExtractor, RegexBodyExtractor};
use crate::ai::GeneratedReply;
use crate::mail::MergedCompose;

const PARAGRAPH_OPEN: &str = r#"<p style="margin-bottom: 1em;">"#;
const DIVIDER: &str = r#"<hr style="margin: 1em 0;" />"#;

/// Render a generated reply as HTML paragraphs.
///
/// Blank lines separate paragraphs and single newlines become `<br>`. A
/// subject in a structured reply becomes the first paragraph.
pub fn format_reply_html(reply: &GeneratedReply) -> String {
    let body = reply.body().replace("\r\n", "\n");

    let mut paragraphs: Vec<String> = Vec::new();
    if let Some(subject) = reply.subject() {
        paragraphs.push(subject.to_string());
    }
    paragraphs.extend(
        body.split("\n\n")
            .map(|p| p.trim_matches('\n'))
            .filter(|p| !p.is_empty())
            .map(|p| p.replace('\n', "<br>")),
    );

    format!(
        "{}{}</p>",
        PARAGRAPH_OPEN,
        paragraphs.join(&format!("</p>\n{}", PARAGRAPH_OPEN))
    )
}

/// Merge a generated reply above the current compose body
pub fn merge_reply(reply: &GeneratedReply, current_body_html: &str) -> MergedCompose {
    merge_reply_with(&RegexBodyExtractor, reply, current_body_html)
}

/// Same as [`merge_reply`] with a caller-chosen body extractor
pub fn merge_reply_with<E: BodyExtractor>(
    extractor: &E,
    reply: &GeneratedReply,
    current_body_html: &str,
) -> MergedCompose {
    let prior = match extractor.extract(current_body_html) {
        Some(inner) => inner,
        None => {
            tracing::debug!("Compose body has no <body> element, keeping it verbatim");
            current_body_html
        }
    };

    let body = format!(
        "<!DOCTYPE html>\n<html>\n<body>\n{}\n{}\n{}\n</body>\n</html>\n",
        format_reply_html(reply),
        DIVIDER,
        prior
    );

    MergedCompose {
        body,
        is_plain_text: false,
    }
}
