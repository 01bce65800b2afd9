mod memory;

pub use memory::MemoryHistoryStore;

use async_trait::async_trait;
use log::info;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use crate::models::chat::{ ChatMessage, Role };

pub const DEFAULT_MAX_TURNS: usize = 20;

/// Conversation history keyed by conversation id. Histories live for the
/// whole process; there is no deletion.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Returns the history for `conversation_id`, creating an empty one if unseen.
    async fn get_or_create(&self, conversation_id: &str) -> Vec<ChatMessage>;

    /// Appends one turn and applies the trailing-window cap.
    async fn append(&self, conversation_id: &str, message: ChatMessage);

    async fn stats(&self) -> StoreStats;

    /// Lock serializing whole exchanges on one conversation. Different ids
    /// get different locks.
    async fn exchange_lock(&self, conversation_id: &str) -> Arc<Mutex<()>>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreStats {
    pub conversation_count: usize,
    pub message_count: usize,
    pub average_messages: f64,
}

impl StoreStats {
    pub fn from_counts(conversation_count: usize, message_count: usize) -> Self {
        let average_messages = if conversation_count == 0 {
            0.0
        } else {
            ((message_count as f64 / conversation_count as f64) * 10.0).round() / 10.0
        };
        Self { conversation_count, message_count, average_messages }
    }
}

/// How the trailing window is cut once a history exceeds its cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrimPolicy {
    /// Keep the last N raw turns, even if that splits a user/assistant pair.
    #[default]
    Turns,
    /// Like `Turns`, then drop a leading assistant turn whose user turn aged out.
    Pairs,
}

impl fmt::Display for TrimPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrimPolicy::Turns => f.write_str("turns"),
            TrimPolicy::Pairs => f.write_str("pairs"),
        }
    }
}

impl FromStr for TrimPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "turns" => Ok(TrimPolicy::Turns),
            "pairs" => Ok(TrimPolicy::Pairs),
            _ => Err(format!("Unsupported history trim policy: {}", s)),
        }
    }
}

pub fn apply_window(messages: &mut Vec<ChatMessage>, max_turns: usize, policy: TrimPolicy) {
    if messages.len() <= max_turns {
        return;
    }
    let excess = messages.len() - max_turns;
    messages.drain(..excess);

    if policy == TrimPolicy::Pairs
        && messages.first().is_some_and(|m| m.role == Role::Assistant)
    {
        messages.remove(0);
    }
}

pub fn create_history_store(max_turns: usize, trim: TrimPolicy) -> Arc<dyn HistoryStore> {
    info!("Chat history kept in memory: last {} turns per conversation ({} trim)", max_turns, trim);
    Arc::new(MemoryHistoryStore::new(max_turns, trim))
}
