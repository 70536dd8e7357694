//! Generate AI reply bodies for an email being composed and splice them into
//! the compose document.
//!
//! A request flows through [`ai::extract_context`], [`ai::build_payload`] and
//! [`ai::GenerationClient`], driven by [`ai::ReplyService`]. Once a reply comes
//! back, [`compose::apply_reply`] merges it above the existing body.

pub mod ai;
pub mod compose;
pub mod config;
pub mod constants;
pub mod mail;
