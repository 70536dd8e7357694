//! Prompt text and request payload construction

use super::client::GenerationRequest;
use crate::mail::{ComposeDraft, EmailType, OriginalMessage};

/// Build the instruction prompt for a generation request.
///
/// The original-email block is only included for replies and threads with a
/// non-empty original body.
pub fn build_prompt(
    original: Option<&OriginalMessage>,
    draft: &ComposeDraft,
    instructions: &str,
    email_type: EmailType,
) -> String {
    let mut prompt = format!("Compose an email of type: {}\n", email_type);

    if let Some(original) = original.filter(|o| !o.body.is_empty())
        && email_type.uses_context()
    {
        let title = if email_type == EmailType::Thread {
            "Original email thread"
        } else {
            "Original email"
        };
        let subject = if original.subject.is_empty() {
            &draft.subject
        } else {
            &original.subject
        };
        prompt.push_str(&format!("{}:\n", title));
        prompt.push_str(&format!("Subject: {}\n", subject));
        prompt.push_str(&format!("Body: {}\n\n", original.body));
    }

    prompt.push_str(&format!("Instructions: {}\n\n", instructions));

    let target = if email_type == EmailType::New {
        "body"
    } else {
        "reply"
    };
    prompt.push_str(&format!(
        "Please generate an appropriate email {} based on the above information.",
        target
    ));
    prompt
}

/// Build the JSON payload sent to the generation service
pub fn build_payload(
    original: Option<&OriginalMessage>,
    draft: &ComposeDraft,
    instructions: &str,
    email_type: EmailType,
) -> GenerationRequest {
    let body = original
        .map(|o| o.body.as_str())
        .filter(|b| !b.is_empty())
        .unwrap_or(draft.plain_text_body.as_str())
        .to_string();

    GenerationRequest {
        instructions: instructions.to_string(),
        email_type,
        subject: draft.subject.clone(),
        body,
        sender: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ComposeDraft {
        ComposeDraft {
            subject: "Re: Budget".to_string(),
            plain_text_body: "draft text".to_string(),
            body: "<html><body>draft text</body></html>".to_string(),
            related_message_id: None,
        }
    }

    fn original() -> OriginalMessage {
        OriginalMessage {
            subject: "Budget".to_string(),
            body: "Can you send the numbers?".to_string(),
        }
    }

    #[test]
    fn test_reply_prompt_layout() {
        let prompt = build_prompt(Some(&original()), &draft(), "Say yes", EmailType::Reply);
        assert_eq!(
            prompt,
            "Compose an email of type: reply\n\
             Original email:\n\
             Subject: Budget\n\
             Body: Can you send the numbers?\n\n\
             Instructions: Say yes\n\n\
             Please generate an appropriate email reply based on the above information."
        );
    }

    #[test]
    fn test_thread_prompt_title() {
        let prompt = build_prompt(Some(&original()), &draft(), "Summarize", EmailType::Thread);
        assert!(prompt.contains("Original email thread:\n"));
        assert!(prompt.ends_with("email reply based on the above information."));
    }

    #[test]
    fn test_new_prompt_skips_original() {
        let prompt = build_prompt(Some(&original()), &draft(), "Invite the team", EmailType::New);
        assert_eq!(
            prompt,
            "Compose an email of type: new\n\
             Instructions: Invite the team\n\n\
             Please generate an appropriate email body based on the above information."
        );
    }

    #[test]
    fn test_subject_falls_back_to_draft() {
        let original = OriginalMessage {
            subject: String::new(),
            body: "Hi".to_string(),
        };
        let prompt = build_prompt(Some(&original), &draft(), "Reply", EmailType::Reply);
        assert!(prompt.contains("Subject: Re: Budget\n"));
    }

    #[test]
    fn test_empty_original_body_is_omitted() {
        let original = OriginalMessage {
            subject: "Budget".to_string(),
            body: String::new(),
        };
        let prompt = build_prompt(Some(&original), &draft(), "Reply", EmailType::Reply);
        assert!(!prompt.contains("Original email"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_prompt(Some(&original()), &draft(), "Say yes", EmailType::Thread);
        let b = build_prompt(Some(&original()), &draft(), "Say yes", EmailType::Thread);
        assert_eq!(a, b);
    }

    #[test]
    fn test_payload_prefers_original_body() {
        let payload = build_payload(Some(&original()), &draft(), "Say yes", EmailType::Reply);
        assert_eq!(payload.body, "Can you send the numbers?");
        assert_eq!(payload.subject, "Re: Budget");
        assert_eq!(payload.sender, "");
        assert_eq!(payload.email_type, EmailType::Reply);
    }

    #[test]
    fn test_payload_body_fallbacks() {
        let payload = build_payload(None, &draft(), "Say yes", EmailType::New);
        assert_eq!(payload.body, "draft text");

        let empty = ComposeDraft::default();
        let payload = build_payload(None, &empty, "Say yes", EmailType::New);
        assert_eq!(payload.body, "");
    }
}
