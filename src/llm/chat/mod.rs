pub mod completions;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use super::LlmConfig;
use self::completions::CompletionsChatClient;
use crate::error::GatewayError;
use crate::models::chat::ChatMessage;

/// Text of the first completion choice, if the provider returned one.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CompletionResponse {
    pub response: Option<String>,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage]
    ) -> Result<CompletionResponse, GatewayError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, GatewayError> {
    let client = CompletionsChatClient::from_config(config)?;
    Ok(Arc::new(client))
}
