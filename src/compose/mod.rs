//! Merging generated replies into the compose document

mod extract;
mod merge;
mod surface;

pub use extract::{BodyExtractor, RegexBodyExtractor};
pub use merge::{format_reply_html, merge_reply, merge_reply_with};
pub use surface::{ComposeSurface, DraftFile, SurfaceError, apply_reply};
