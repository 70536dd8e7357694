//! AI reply generation
//!
//! The pipeline behind the "generate reply" action:
//! - Context extraction from the mail store (single message or whole thread)
//! - Prompt and payload construction
//! - The HTTP client for the generation service
//! - A background actor serving typed `{action, data}` requests, one at a time

mod actor;
mod client;
mod context;
mod prompts;
mod service;

pub use actor::{ReplyActorHandle, ServiceMessage, ServiceResult, spawn_reply_actor};
pub use client::{GenerateError, GeneratedReply, GenerationClient, GenerationRequest, extract_reply};
pub use context::{extract_context, render_thread};
pub use prompts::{build_payload, build_prompt};
pub use service::{GenerateReplyData, ReplyService, RequestToken};
