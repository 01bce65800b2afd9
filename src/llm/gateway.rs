use log::{ debug, error };
use std::sync::Arc;

use super::chat::ChatClient;
use crate::error::GatewayError;
use crate::models::chat::ChatMessage;

/// Sends the system prompt plus stored history to the provider and returns
/// the reply text. Never returns an empty reply: a missing or empty
/// completion is replaced with the configured fallback. No retries.
#[derive(Clone)]
pub struct CompletionGateway {
    client: Arc<dyn ChatClient>,
    fallback_response: String,
}

impl CompletionGateway {
    pub fn new(client: Arc<dyn ChatClient>, fallback_response: impl Into<String>) -> Self {
        Self {
            client,
            fallback_response: fallback_response.into(),
        }
    }

    pub async fn complete(
        &self,
        system_prompt: &str,
        history: &[ChatMessage]
    ) -> Result<String, GatewayError> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend_from_slice(history);

        let completion = self.client.complete(&messages).await.map_err(|e| {
            error!("Completion via {} failed: {}", self.client.get_model(), e);
            e
        })?;

        match completion.response {
            Some(text) if !text.is_empty() => Ok(text),
            _ => {
                debug!("Provider returned no text, using fallback reply");
                Ok(self.fallback_response.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::CompletionResponse;
    use crate::models::chat::Role;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    struct RecordingClient {
        reply: Option<String>,
        seen: Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl ChatClient for RecordingClient {
        async fn complete(
            &self,
            messages: &[ChatMessage]
        ) -> Result<CompletionResponse, GatewayError> {
            *self.seen.lock().await = messages.to_vec();
            Ok(CompletionResponse { response: self.reply.clone() })
        }

        fn get_model(&self) -> String {
            "recording".into()
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    struct FailingClient;

    #[async_trait]
    impl ChatClient for FailingClient {
        async fn complete(&self, _: &[ChatMessage]) -> Result<CompletionResponse, GatewayError> {
            Err(GatewayError::Status { status: 503, body: "overloaded".into() })
        }

        fn get_model(&self) -> String {
            "failing".into()
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn prepends_system_prompt_without_touching_history() {
        let client = Arc::new(RecordingClient { reply: Some("ok".into()), seen: Mutex::new(vec![]) });
        let gateway = CompletionGateway::new(client.clone(), "sorry");
        let history = vec![ChatMessage::user("a"), ChatMessage::assistant("b"), ChatMessage::user("c")];

        let reply = gateway.complete("persona", &history).await.unwrap();

        assert_eq!(reply, "ok");
        let seen = client.seen.lock().await;
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], ChatMessage::system("persona"));
        assert_eq!(&seen[1..], history.as_slice());
        assert_eq!(history.iter().filter(|m| m.role == Role::System).count(), 0);
    }

    #[tokio::test]
    async fn missing_or_empty_reply_uses_fallback() {
        for reply in [None, Some(String::new())] {
            let client = Arc::new(RecordingClient { reply, seen: Mutex::new(vec![]) });
            let gateway = CompletionGateway::new(client, "sorry");
            let text = gateway.complete("persona", &[ChatMessage::user("hi")]).await.unwrap();
            assert_eq!(text, "sorry");
        }
    }

    #[tokio::test]
    async fn whitespace_reply_is_kept() {
        let client = Arc::new(RecordingClient { reply: Some("   ".into()), seen: Mutex::new(vec![]) });
        let gateway = CompletionGateway::new(client, "sorry");
        let text = gateway.complete("persona", &[ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(text, "   ");
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let gateway = CompletionGateway::new(Arc::new(FailingClient), "sorry");
        let err = gateway.complete("persona", &[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, GatewayError::Status { status: 503, .. }));
    }
}
