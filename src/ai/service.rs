//! Reply generation pipeline: context → prompt/payload → generation service

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::client::{GenerateError, GeneratedReply, GenerationClient};
use super::context::extract_context;
use super::prompts::{build_payload, build_prompt};
use crate::mail::{ComposeDraft, EmailType, MailStore, MessageId};

/// Caller-chosen tag identifying one generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(pub u64);

impl RequestToken {
    /// Allocate a process-unique token
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything the compose side sends to ask for a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReplyData {
    pub instructions: String,
    pub compose_details: ComposeDraft,
    #[serde(default)]
    pub original_message_id: Option<MessageId>,
    pub email_type: EmailType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_token: Option<RequestToken>,
}

impl GenerateReplyData {
    /// Request for the draft's linked message
    pub fn new(instructions: impl Into<String>, draft: ComposeDraft, email_type: EmailType) -> Self {
        Self {
            instructions: instructions.into(),
            original_message_id: draft.related_message_id,
            compose_details: draft,
            email_type,
            request_token: None,
        }
    }

    pub fn with_token(mut self, token: RequestToken) -> Self {
        self.request_token = Some(token);
        self
    }
}

/// At most one generation run at a time
#[derive(Debug, Default)]
struct InFlight {
    active: Mutex<Option<Option<RequestToken>>>,
}

impl InFlight {
    fn acquire(&self, token: Option<RequestToken>) -> Result<InFlightGuard<'_>, GenerateError> {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(current) = *active {
            return Err(GenerateError::Busy { active: current });
        }
        *active = Some(token);
        Ok(InFlightGuard { slot: self })
    }
}

struct InFlightGuard<'a> {
    slot: &'a InFlight,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut active = self
            .slot
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *active = None;
    }
}

/// Drives context extraction, prompt building and the generation call
pub struct ReplyService<S> {
    store: Arc<S>,
    client: GenerationClient,
    in_flight: InFlight,
}

impl<S: MailStore> ReplyService<S> {
    pub fn new(store: Arc<S>, client: GenerationClient) -> Self {
        Self {
            store,
            client,
            in_flight: InFlight::default(),
        }
    }

    /// Whether a generation run is currently in progress
    pub fn is_busy(&self) -> bool {
        self.in_flight
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Generate a reply. Overlapping calls fail with [`GenerateError::Busy`].
    pub async fn generate_reply(
        &self,
        request: GenerateReplyData,
    ) -> Result<GeneratedReply, GenerateError> {
        let instructions = request.instructions.trim();
        if instructions.is_empty() {
            return Err(GenerateError::MissingInstructions);
        }

        let _guard = self.in_flight.acquire(request.request_token)?;
        let token = request
            .request_token
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        tracing::info!(
            "Generating {} reply (request {})",
            request.email_type,
            token
        );

        let original = extract_context(
            self.store.as_ref(),
            request.original_message_id,
            request.email_type,
        )
        .await;
        if original.is_none() && request.email_type.uses_context() {
            tracing::debug!("Generating without original-message context");
        }

        let prompt = build_prompt(
            original.as_ref(),
            &request.compose_details,
            instructions,
            request.email_type,
        );
        tracing::debug!("Prompt:\n{}", prompt);

        let payload = build_payload(
            original.as_ref(),
            &request.compose_details,
            instructions,
            request.email_type,
        );

        let result = self.client.generate(&payload, request.email_type).await;
        match &result {
            Ok(_) => tracing::info!("Reply generated (request {})", token),
            Err(e) => tracing::warn!("Reply generation failed (request {}): {}", token, e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::{MemoryStore, MessageHeader, MessagePart, StoredMessage};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, method, path},
    };

    fn store() -> MemoryStore {
        MemoryStore::new().with_message(StoredMessage {
            header: MessageHeader {
                id: MessageId(1),
                subject: "Offsite".to_string(),
                folder: "Inbox".to_string(),
                thread_id: "t1".to_string(),
                snippet: "Are you coming?".to_string(),
            },
            parts: vec![(
                MessagePart {
                    content_type: "text/plain".to_string(),
                    part_id: "1".to_string(),
                },
                "Are you coming to the offsite?".to_string(),
            )],
        })
    }

    fn draft() -> ComposeDraft {
        ComposeDraft {
            subject: "Re: Offsite".to_string(),
            plain_text_body: String::new(),
            body: "<html><body></body></html>".to_string(),
            related_message_id: Some(MessageId(1)),
        }
    }

    fn service_for(server: &MockServer, store: MemoryStore) -> ReplyService<MemoryStore> {
        let client = GenerationClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        ReplyService::new(Arc::new(store), client)
    }

    #[tokio::test]
    async fn test_reply_sends_original_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate-reply"))
            .and(body_partial_json(json!({
                "instructions": "Say yes",
                "emailType": "reply",
                "subject": "Re: Offsite",
                "body": "Are you coming to the offsite?",
                "sender": ""
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "Yes!"})))
            .expect(1)
            .mount(&server)
            .await;

        let service = service_for(&server, store());
        let reply = service
            .generate_reply(GenerateReplyData::new("  Say yes ", draft(), EmailType::Reply))
            .await
            .unwrap();
        assert_eq!(reply.body(), "Yes!");
        assert!(!service.is_busy());
    }

    #[tokio::test]
    async fn test_store_failure_still_generates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate-reply"))
            .and(body_partial_json(json!({"body": "my notes"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut offline = store();
        offline.set_offline(true);
        let mut draft = draft();
        draft.plain_text_body = "my notes".to_string();

        let reply = service_for(&server, offline)
            .generate_reply(GenerateReplyData::new("Reply", draft, EmailType::Thread))
            .await
            .unwrap();
        assert_eq!(reply.body(), "ok");
    }

    #[tokio::test]
    async fn test_blank_instructions_rejected() {
        let server = MockServer::start().await;
        let service = service_for(&server, store());
        let err = service
            .generate_reply(GenerateReplyData::new("   ", draft(), EmailType::Reply))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::MissingInstructions));
    }

    #[tokio::test]
    async fn test_remote_failure_releases_slot() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let service = service_for(&server, store());
        let err = service
            .generate_reply(GenerateReplyData::new("Reply", draft(), EmailType::New))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::Remote { status: 500, .. }));
        assert!(!service.is_busy());
    }

    #[tokio::test]
    async fn test_overlapping_requests_are_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"reply": "done"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let service = Arc::new(service_for(&server, store()));
        let first_token = RequestToken::next();

        let first = {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .generate_reply(
                        GenerateReplyData::new("Reply", draft(), EmailType::Reply)
                            .with_token(first_token),
                    )
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(service.is_busy());

        let err = service
            .generate_reply(
                GenerateReplyData::new("Reply again", draft(), EmailType::Reply)
                    .with_token(RequestToken::next()),
            )
            .await
            .unwrap_err();
        match err {
            GenerateError::Busy { active } => assert_eq!(active, Some(first_token)),
            other => panic!("expected busy, got {:?}", other),
        }

        let reply = first.await.unwrap().unwrap();
        assert_eq!(reply.body(), "done");

        let reply = service
            .generate_reply(GenerateReplyData::new("Once more", draft(), EmailType::Reply))
            .await
            .unwrap();
        assert_eq!(reply.body(), "done");
    }
}
