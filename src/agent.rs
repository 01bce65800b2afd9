use crate::cli::Args;
use crate::config::prompt::{ load_prompts, PromptConfig };
use crate::error::ChatError;
use crate::history::{ create_history_store, HistoryStore, StoreStats, TrimPolicy };
use crate::llm::{ LlmConfig, LlmType };
use crate::llm::chat::new_client as new_chat_client;
use crate::llm::gateway::CompletionGateway;
use crate::models::api::ChatResponse;
use crate::models::chat::ChatMessage;

use log::{ debug, info, warn };
use std::error::Error;
use std::sync::Arc;
use uuid::Uuid;

/// Mints a fresh conversation id. Random, so two requests never share one.
pub fn mint_conversation_id() -> String {
    format!("conv_{}", Uuid::new_v4().simple())
}

/// Ties the history store to the completion gateway for one chat exchange.
pub struct ChatAgent {
    gateway: CompletionGateway,
    history_store: Arc<dyn HistoryStore>,
    system_prompt: String,
}

impl ChatAgent {
    pub fn new(
        gateway: CompletionGateway,
        history_store: Arc<dyn HistoryStore>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            history_store,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn from_args(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let llm_type: LlmType = args.chat_llm_type.parse()?;
        let chat_config = LlmConfig {
            llm_type,
            api_key: Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()),
            completion_model: args.chat_model.clone(),
            base_url: args.chat_base_url.clone(),
            temperature: args.chat_temperature,
            max_tokens: args.chat_max_tokens,
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={}",
            llm_type,
            chat_client.get_model(),
            chat_client.get_base_url().as_deref().unwrap_or("adapter default")
        );

        let prompts: PromptConfig = load_prompts(args.prompts_path.as_deref())?;
        let trim: TrimPolicy = args.history_trim.parse()?;
        let history_store = create_history_store(args.history_max_turns, trim);

        Ok(Self::new(
            CompletionGateway::new(chat_client, prompts.fallback_response),
            history_store,
            prompts.system_prompt,
        ))
    }

    /// Runs one exchange: store the user turn, ask the provider, store the
    /// reply. Exchanges on the same conversation are serialized. On provider
    /// failure the user turn stays in history.
    pub async fn handle_message(
        &self,
        message: Option<&str>,
        conversation_id: Option<&str>,
    ) -> Result<ChatResponse, ChatError> {
        let message = match message {
            Some(m) if !m.is_empty() => m,
            _ => return Err(ChatError::Validation("message required".to_string())),
        };

        let conversation_id = match conversation_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let id = mint_conversation_id();
                debug!("Started conversation {}", id);
                id
            }
        };

        let exchange = self.history_store.exchange_lock(&conversation_id).await;
        let _guard = exchange.lock().await;

        self.history_store.append(&conversation_id, ChatMessage::user(message)).await;

        let history = self.history_store.get_or_create(&conversation_id).await;
        let reply = match self.gateway.complete(&self.system_prompt, &history).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Conversation {}: keeping unanswered user turn after failure", conversation_id);
                return Err(ChatError::Completion(e));
            }
        };

        self.history_store.append(&conversation_id, ChatMessage::assistant(reply.clone())).await;
        let history_len = self.history_store.get_or_create(&conversation_id).await.len();

        info!("Conversation {}: {} turns stored", conversation_id, history_len);

        Ok(ChatResponse {
            response: reply,
            conversation_id,
            message_count: history_len / 2,
        })
    }

    pub async fn stats(&self) -> StoreStats {
        self.history_store.stats().await
    }

    pub fn history_store(&self) -> &Arc<dyn HistoryStore> {
        &self.history_store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::history::{ MemoryHistoryStore, DEFAULT_MAX_TURNS };
    use crate::llm::chat::{ ChatClient, CompletionResponse };
    use crate::models::chat::Role;
    use async_trait::async_trait;
    use std::sync::atomic::{ AtomicBool, AtomicUsize, Ordering };
    use std::time::Duration;

    /// Replies "reply N" and can be switched into failure mode.
    #[derive(Default)]
    struct ScriptedClient {
        calls: AtomicUsize,
        fail: AtomicBool,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn complete(
            &self,
            _messages: &[ChatMessage]
        ) -> Result<CompletionResponse, GatewayError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail.load(Ordering::SeqCst) {
                return Err(GatewayError::Status { status: 500, body: "boom".into() });
            }
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(CompletionResponse { response: Some(format!("reply {}", n)) })
        }

        fn get_model(&self) -> String {
            "scripted".into()
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    fn agent_with(client: Arc<ScriptedClient>) -> ChatAgent {
        let store = Arc::new(MemoryHistoryStore::new(DEFAULT_MAX_TURNS, TrimPolicy::Turns));
        ChatAgent::new(CompletionGateway::new(client, "sorry"), store, "persona")
    }

    #[tokio::test]
    async fn two_exchanges_build_four_turn_history() {
        let agent = agent_with(Arc::new(ScriptedClient::default()));

        let first = agent.handle_message(Some("halo"), None).await.unwrap();
        assert!(first.conversation_id.starts_with("conv_"));
        assert_eq!(first.message_count, 1);
        assert_eq!(first.response, "reply 1");

        let second = agent
            .handle_message(Some("ok"), Some(first.conversation_id.as_str()))
            .await
            .unwrap();
        assert_eq!(second.conversation_id, first.conversation_id);
        assert_eq!(second.message_count, 2);

        let messages = agent.history_store().get_or_create(&first.conversation_id).await;
        assert_eq!(messages, vec![
            ChatMessage::user("halo"),
            ChatMessage::assistant("reply 1"),
            ChatMessage::user("ok"),
            ChatMessage::assistant("reply 2"),
        ]);
    }

    #[tokio::test]
    async fn eleven_exchanges_drop_oldest_pair() {
        let agent = agent_with(Arc::new(ScriptedClient::default()));
        let id = "conv_cap".to_string();

        let mut last = None;
        for i in 1..=11 {
            last = Some(agent.handle_message(Some(format!("q{}", i).as_str()), Some(id.as_str())).await.unwrap());
        }

        let messages = agent.history_store().get_or_create(&id).await;
        assert_eq!(messages.len(), 20);
        assert_eq!(messages[0], ChatMessage::user("q2"));
        assert!(!messages.contains(&ChatMessage::user("q1")));
        assert!(!messages.contains(&ChatMessage::assistant("reply 1")));
        assert_eq!(last.unwrap().message_count, 10);
    }

    #[tokio::test]
    async fn empty_message_is_rejected_without_mutation() {
        let agent = agent_with(Arc::new(ScriptedClient::default()));

        for message in [None, Some("")] {
            let err = agent.handle_message(message, Some("conv_x")).await.unwrap_err();
            assert!(matches!(err, ChatError::Validation(_)));
        }

        assert_eq!(agent.stats().await, StoreStats::from_counts(0, 0));
    }

    #[tokio::test]
    async fn whitespace_message_is_a_real_turn() {
        let agent = agent_with(Arc::new(ScriptedClient::default()));

        let reply = agent.handle_message(Some("   "), Some("conv_ws")).await.unwrap();
        assert_eq!(reply.message_count, 1);
        assert_eq!(agent.history_store().get_or_create("conv_ws").await[0], ChatMessage::user("   "));
    }

    #[tokio::test]
    async fn failure_keeps_orphan_user_turn() {
        let client = Arc::new(ScriptedClient::default());
        let agent = agent_with(client.clone());

        let ok = agent.handle_message(Some("halo"), None).await.unwrap();
        assert_eq!(agent.stats().await.message_count, 2);

        client.fail.store(true, Ordering::SeqCst);
        let err = agent.handle_message(Some("lagi"), Some(ok.conversation_id.as_str())).await.unwrap_err();
        assert!(matches!(err, ChatError::Completion(_)));
        assert_eq!(agent.stats().await.message_count, 3);

        client.fail.store(false, Ordering::SeqCst);
        agent.handle_message(Some("lagi"), Some(ok.conversation_id.as_str())).await.unwrap();

        let messages = agent.history_store().get_or_create(&ok.conversation_id).await;
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::User, Role::Assistant]);
        assert_eq!(messages[2], ChatMessage::user("lagi"));
        assert_eq!(messages[3], ChatMessage::user("lagi"));
    }

    #[tokio::test]
    async fn minted_ids_are_distinct() {
        let agent = agent_with(Arc::new(ScriptedClient::default()));
        let a = agent.handle_message(Some("a"), None).await.unwrap();
        let b = agent.handle_message(Some("b"), None).await.unwrap();
        assert_ne!(a.conversation_id, b.conversation_id);
        assert_eq!(agent.stats().await.conversation_count, 2);
    }

    #[tokio::test]
    async fn blank_conversation_id_mints_new_one() {
        let agent = agent_with(Arc::new(ScriptedClient::default()));
        let reply = agent.handle_message(Some("a"), Some("")).await.unwrap();
        assert!(reply.conversation_id.starts_with("conv_"));
    }

    #[tokio::test]
    async fn same_conversation_exchanges_do_not_interleave() {
        let client = Arc::new(ScriptedClient {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let agent = Arc::new(agent_with(client.clone()));

        let mut handles = Vec::new();
        for i in 0..5 {
            let agent = agent.clone();
            handles.push(tokio::spawn(async move {
                agent.handle_message(Some(format!("m{}", i).as_str()), Some("shared")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(client.max_in_flight.load(Ordering::SeqCst), 1);
        let messages = agent.history_store().get_or_create("shared").await;
        assert_eq!(messages.len(), 10);
        for pair in messages.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
        }
    }

    #[tokio::test]
    async fn different_conversations_run_in_parallel() {
        let client = Arc::new(ScriptedClient {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let agent = Arc::new(agent_with(client.clone()));

        let a = { let agent = agent.clone(); tokio::spawn(async move { agent.handle_message(Some("x"), Some("a")).await }) };
        let b = { let agent = agent.clone(); tokio::spawn(async move { agent.handle_message(Some("y"), Some("b")).await }) };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(client.max_in_flight.load(Ordering::SeqCst), 2);
    }
}
