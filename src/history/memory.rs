use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{ Mutex, RwLock };

use super::{ apply_window, HistoryStore, StoreStats, TrimPolicy };
use crate::models::chat::ChatMessage;

#[derive(Default)]
struct ConversationSlot {
    messages: Mutex<Vec<ChatMessage>>,
    exchange: Arc<Mutex<()>>,
}

/// Process-local store. The map lock is only held to find or insert a slot;
/// each conversation then has its own locks so unrelated ids never contend.
pub struct MemoryHistoryStore {
    conversations: RwLock<HashMap<String, Arc<ConversationSlot>>>,
    max_turns: usize,
    trim: TrimPolicy,
}

impl MemoryHistoryStore {
    pub fn new(max_turns: usize, trim: TrimPolicy) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            max_turns,
            trim,
        }
    }

    async fn slot(&self, conversation_id: &str) -> Arc<ConversationSlot> {
        if let Some(slot) = self.conversations.read().await.get(conversation_id) {
            return slot.clone();
        }
        let mut conversations = self.conversations.write().await;
        conversations
            .entry(conversation_id.to_string())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn get_or_create(&self, conversation_id: &str) -> Vec<ChatMessage> {
        let slot = self.slot(conversation_id).await;
        let messages = slot.messages.lock().await;
        messages.clone()
    }

    async fn append(&self, conversation_id: &str, message: ChatMessage) {
        let slot = self.slot(conversation_id).await;
        let mut messages = slot.messages.lock().await;
        messages.push(message);
        apply_window(&mut messages, self.max_turns, self.trim);
    }

    async fn stats(&self) -> StoreStats {
        let slots: Vec<Arc<ConversationSlot>> = self.conversations
            .read().await
            .values()
            .cloned()
            .collect();

        let mut message_count = 0;
        for slot in &slots {
            message_count += slot.messages.lock().await.len();
        }
        StoreStats::from_counts(slots.len(), message_count)
    }

    async fn exchange_lock(&self, conversation_id: &str) -> Arc<Mutex<()>> {
        self.slot(conversation_id).await.exchange.clone()
    }
}
