//! Generation service HTTP client

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use super::service::RequestToken;
use crate::constants::{COMPOSE_PATH, GENERATE_REPLY_PATH};
use crate::mail::EmailType;

/// Field names the service may put the generated text under, in priority order
const REPLY_FIELDS: [&str; 3] = ["reply", "response", "text"];

/// Errors surfaced to whoever asked for a reply
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation request failed: {status} {status_text}")]
    Remote { status: u16, status_text: String },
    #[error("no valid reply received from the generation service")]
    EmptyReply,
    #[error("generation service did not answer within {0:?}")]
    Timeout(Duration),
    #[error("could not reach the generation service: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("could not decode the generation service response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("a reply is already being generated")]
    Busy { active: Option<RequestToken> },
    #[error("instructions must not be empty")]
    MissingInstructions,
    #[error("reply service is not running")]
    ServiceStopped,
}

/// Payload accepted by both service routes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub instructions: String,
    pub email_type: EmailType,
    pub subject: String,
    pub body: String,
    /// Always empty; kept because the service requires the field
    pub sender: String,
}

/// Generated text exactly as the service returned it.
///
/// The service answers either with a bare string or with an object carrying
/// `subject` and `body`; [`subject`](Self::subject) and [`body`](Self::body)
/// read whichever shape is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratedReply(pub Value);

impl GeneratedReply {
    pub fn subject(&self) -> Option<&str> {
        self.0
            .get("subject")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn body(&self) -> String {
        match &self.0 {
            Value::String(text) => text.clone(),
            Value::Object(map) => map
                .get("body")
                .and_then(text_of)
                .or_else(|| map.get("text").and_then(text_of))
                .unwrap_or_default(),
            other => other.to_string(),
        }
    }
}

impl From<&str> for GeneratedReply {
    fn from(text: &str) -> Self {
        Self(Value::String(text.to_string()))
    }
}

/// Text carried by a field, unwrapping `{"text": ...}` objects
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::String(_) | Value::Null => None,
        Value::Object(map) => map.get("text").and_then(text_of),
        other => Some(other.to_string()),
    }
}

/// A value counts as present unless it is null, false, zero or an empty string
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Pick the generated reply out of a decoded response body
pub fn extract_reply(response: &Value) -> Result<GeneratedReply, GenerateError> {
    REPLY_FIELDS
        .iter()
        .filter_map(|field| response.get(*field))
        .find(|value| is_present(value))
        .map(|value| GeneratedReply(value.clone()))
        .ok_or(GenerateError::EmptyReply)
}

/// Client for the `/compose` and `/generate-reply` routes
#[derive(Clone)]
pub struct GenerationClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl GenerationClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GenerateError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GenerateError::Transport)?;

        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn endpoint(&self, email_type: EmailType) -> String {
        let path = match email_type {
            EmailType::New => COMPOSE_PATH,
            EmailType::Reply | EmailType::Thread => GENERATE_REPLY_PATH,
        };
        format!("{}{}", self.base_url, path)
    }

    /// Post the payload and return the generated reply
    pub async fn generate(
        &self,
        payload: &GenerationRequest,
        email_type: EmailType,
    ) -> Result<GeneratedReply, GenerateError> {
        let url = self.endpoint(email_type);
        tracing::debug!("Posting {} generation request to {}", email_type, url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| self.classify(e, GenerateError::Transport))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Generation service returned {}", status);
            return Err(GenerateError::Remote {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| self.classify(e, GenerateError::Decode))?;

        let reply = extract_reply(&body)?;
        tracing::debug!("Received reply from generation service");
        Ok(reply)
    }

    fn classify(
        &self,
        error: reqwest::Error,
        otherwise: fn(reqwest::Error) -> GenerateError,
    ) -> GenerateError {
        if error.is_timeout() {
            GenerateError::Timeout(self.timeout)
        } else {
            otherwise(error)
        }
    }
}
