//! Locating the existing content of an HTML compose body

use regex::Regex;
use std::sync::OnceLock;

/// Pulls the inner content out of an HTML document's `<body>` element
pub trait BodyExtractor {
    /// Inner content of the body element, or `None` if the input has none
    fn extract<'a>(&self, html: &'a str) -> Option<&'a str>;
}

static BODY_PATTERN: OnceLock<Regex> = OnceLock::new();

fn body_pattern() -> &'static Regex {
    BODY_PATTERN.get_or_init(|| {
        // Greedy so that nested or repeated closing tags stay inside the match
        Regex::new(r"(?is)<body[^>]*>(.*)</body>").expect("body pattern is valid")
    })
}

/// Pattern-based extractor. Matches from the first `<body ...>` to the last
/// `</body>`, case-insensitively and across newlines.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexBodyExtractor;

impl BodyExtractor for RegexBodyExtractor {
    fn extract<'a>(&self, html: &'a str) -> Option<&'a str> {
        body_pattern()
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}
