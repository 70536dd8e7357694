//! Background reply actor.
//!
//! The compose side talks to the pipeline only through typed messages shaped
//! `{ "action": ..., "data": ... }`; each message carries a oneshot sender for
//! its result.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use super::client::{GenerateError, GeneratedReply};
use super::service::{GenerateReplyData, ReplyService};
use crate::constants::ACTOR_CHANNEL_CAPACITY;
use crate::mail::MailStore;

/// Messages understood by the reply actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum ServiceMessage {
    /// Generate a reply for a compose draft
    GenerateReply(GenerateReplyData),
    /// Stop the actor
    Shutdown,
}

pub type ServiceResult = Result<GeneratedReply, GenerateError>;

struct Envelope {
    message: ServiceMessage,
    reply_tx: oneshot::Sender<ServiceResult>,
}

/// Handle for communicating with the reply actor
#[derive(Clone)]
pub struct ReplyActorHandle {
    cmd_tx: mpsc::Sender<Envelope>,
}

impl ReplyActorHandle {
    /// Send a message and wait for its result
    pub async fn send(&self, message: ServiceMessage) -> ServiceResult {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Envelope { message, reply_tx })
            .await
            .map_err(|_| GenerateError::ServiceStopped)?;
        reply_rx.await.map_err(|_| GenerateError::ServiceStopped)?
    }

    pub async fn generate(&self, data: GenerateReplyData) -> ServiceResult {
        self.send(ServiceMessage::GenerateReply(data)).await
    }

    /// Ask the actor to stop; in-flight generations still complete
    pub async fn shutdown(&self) {
        let (reply_tx, _reply_rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(Envelope {
                message: ServiceMessage::Shutdown,
                reply_tx,
            })
            .await;
    }
}

/// Spawn the reply actor task
pub fn spawn_reply_actor<S>(service: Arc<ReplyService<S>>) -> ReplyActorHandle
where
    S: MailStore + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(ACTOR_CHANNEL_CAPACITY);
    tokio::spawn(reply_actor_loop(service, cmd_rx));
    ReplyActorHandle { cmd_tx }
}

async fn reply_actor_loop<S>(service: Arc<ReplyService<S>>, mut cmd_rx: mpsc::Receiver<Envelope>)
where
    S: MailStore + 'static,
{
    while let Some(Envelope { message, reply_tx }) = cmd_rx.recv().await {
        match message {
            ServiceMessage::GenerateReply(data) => {
                // Run each request on its own task so an overlapping request
                // sees Busy instead of waiting in the queue
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    let result = service.generate_reply(data).await;
                    if reply_tx.send(result).is_err() {
                        tracing::warn!("Reply actor: caller dropped before result arrived");
                    }
                });
            }
            ServiceMessage::Shutdown => {
                tracing::debug!("Reply actor shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::GenerationClient;
    use crate::mail::{ComposeDraft, EmailType, MemoryStore, MessageId};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers::method};

    fn spawn_for(server: &MockServer) -> ReplyActorHandle {
        let client = GenerationClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        spawn_reply_actor(Arc::new(ReplyService::new(
            Arc::new(MemoryStore::new()),
            client,
        )))
    }

    #[test]
    fn test_message_wire_shape() {
        let raw = json!({
            "action": "generateReply",
            "data": {
                "instructions": "Decline",
                "composeDetails": {
                    "subject": "Re: Party",
                    "plainTextBody": "",
                    "body": "<html><body></body></html>",
                    "relatedMessageId": 12
                },
                "originalMessageId": 12,
                "emailType": "reply"
            }
        });

        let message: ServiceMessage = serde_json::from_value(raw.clone()).unwrap();
        match &message {
            ServiceMessage::GenerateReply(data) => {
                assert_eq!(data.instructions, "Decline");
                assert_eq!(data.original_message_id, Some(MessageId(12)));
                assert_eq!(data.email_type, EmailType::Reply);
                assert_eq!(data.request_token, None);
            }
            other => panic!("unexpected message {:?}", other),
        }
        assert_eq!(serde_json::to_value(&message).unwrap(), raw);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let raw = json!({"action": "summarize", "data": {}});
        assert!(serde_json::from_value::<ServiceMessage>(raw).is_err());
    }

    #[tokio::test]
    async fn test_generate_through_actor() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "Sure."})))
            .mount(&server)
            .await;

        let handle = spawn_for(&server);
        let reply = handle
            .generate(GenerateReplyData::new(
                "Agree",
                ComposeDraft::default(),
                EmailType::New,
            ))
            .await
            .unwrap();
        assert_eq!(reply.body(), "Sure.");
    }

    #[tokio::test]
    async fn test_failure_is_typed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let handle = spawn_for(&server);
        let err = handle
            .generate(GenerateReplyData::new(
                "Agree",
                ComposeDraft::default(),
                EmailType::Reply,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::Remote { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_overlapping_generate_is_busy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"reply": "done"}))
                    .set_delay(Duration::from_millis(400)),
            )
            .mount(&server)
            .await;

        let handle = spawn_for(&server);
        let first = {
            let handle = handle.clone();
            tokio::spawn(async move {
                handle
                    .generate(GenerateReplyData::new(
                        "Agree",
                        ComposeDraft::default(),
                        EmailType::New,
                    ))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = handle
            .generate(GenerateReplyData::new(
                "Agree again",
                ComposeDraft::default(),
                EmailType::New,
            ))
            .await;
        assert!(matches!(second, Err(GenerateError::Busy { active: None })));

        let reply = first.await.unwrap().unwrap();
        assert_eq!(reply.body(), "done");
    }

    #[tokio::test]
    async fn test_send_after_shutdown() {
        let server = MockServer::start().await;
        let handle = spawn_for(&server);
        handle.shutdown().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = handle
            .generate(GenerateReplyData::new(
                "Agree",
                ComposeDraft::default(),
                EmailType::New,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::ServiceStopped));
    }
}
