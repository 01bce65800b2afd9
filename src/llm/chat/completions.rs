use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION}};
use serde::{Deserialize, Serialize};

use super::{ChatClient, CompletionResponse};
use crate::error::GatewayError;
use crate::llm::{LlmConfig, LlmType};
use crate::models::chat::ChatMessage;

/// Client for the OpenAI-compatible `chat/completions` endpoint shared by
/// Groq, OpenAI and Ollama.
pub struct CompletionsChatClient {
    http: HttpClient,
    llm_type: LlmType,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct CompletionsMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionsRequest<'a> {
    messages: Vec<CompletionsMessage<'a>>,
    model: &'a str,
    temperature: f32,
    #[serde(rename = "max_tokens")]
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionsResponse {
    #[serde(default)]
    choices: Vec<CompletionsChoice>,
}

#[derive(Deserialize)]
struct CompletionsChoice {
    message: Option<CompletionsReply>,
}

#[derive(Deserialize)]
struct CompletionsReply {
    content: Option<String>,
}

impl CompletionsChatClient {
    pub fn new(
        llm_type: LlmType,
        api_key: Option<String>,
        model: Option<String>,
        base_url: Option<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Self, GatewayError> {
        let chat_model = model.unwrap_or_else(|| llm_type.default_model().to_string());
        let api_url = base_url.unwrap_or_else(|| llm_type.default_base_url().to_string());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        match api_key.filter(|k| !k.is_empty()) {
            Some(key) => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", key))
                        .map_err(|e| GatewayError::InvalidApiKey(e.to_string()))?
                );
            }
            None if llm_type.requires_api_key() => {
                return Err(GatewayError::MissingApiKey(llm_type.to_string()));
            }
            None => {}
        }

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            llm_type,
            model: chat_model,
            base_url: api_url,
            temperature,
            max_tokens,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, GatewayError> {
        Self::new(
            config.llm_type,
            config.api_key.clone(),
            config.completion_model.clone(),
            config.base_url.clone(),
            config.temperature,
            config.max_tokens,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatClient for CompletionsChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage]
    ) -> Result<CompletionResponse, GatewayError> {
        let url = self.endpoint();

        let req = CompletionsRequest {
            messages: messages
                .iter()
                .map(|m| CompletionsMessage { role: m.role.as_str(), content: &m.content })
                .collect(),
            model: &self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!("Sending {} messages to {} ({})", messages.len(), url, self.llm_type);

        let resp = self.http.post(&url).json(&req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status: status.as_u16(), body });
        }

        let body = resp.bytes().await?;
        let parsed: CompletionsResponse = serde_json::from_slice(&body)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        let response = parsed.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);

        Ok(CompletionResponse { response })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
