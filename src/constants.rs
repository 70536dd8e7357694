//! Crate-wide constants for tuning and configuration
//!
//! Centralizes magic numbers to make them discoverable and configurable.

/// Origin of the generation service when the config names none.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

/// Route used for brand-new emails.
pub const COMPOSE_PATH: &str = "/compose";

/// Route used for replies and thread replies.
pub const GENERATE_REPLY_PATH: &str = "/generate-reply";

/// Upper bound in seconds on a single generation call.
/// Local models can be slow on first load, so this is generous.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Characters of body text kept in a message snippet.
pub const SNIPPET_LENGTH: usize = 200;

/// Wrap width used when rendering HTML parts to text.
pub const HTML_TEXT_WIDTH: usize = 100;

/// Pending messages the reply actor will buffer before senders wait.
pub const ACTOR_CHANNEL_CAPACITY: usize = 16;
