use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use log::info;

pub const DEFAULT_SYSTEM_PROMPT: &str = "Kamu adalah asisten AI customer service yang ramah dan profesional untuk toko online.

Tugasmu:
- Jawab pertanyaan produk dengan jelas
- Bantu tracking dan status pesanan
- Tangani komplain dengan empati
- Berikan rekomendasi yang relevan
- Proses permintaan return/refund

Selalu jawab dalam Bahasa Indonesia, singkat tapi informatif, dan ramah.";

pub const DEFAULT_FALLBACK_RESPONSE: &str = "Maaf, saya tidak bisa memproses permintaan saat ini.";

#[derive(Debug)]
pub enum PromptError {
    EmptySystemPrompt,
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::EmptySystemPrompt => write!(f, "System prompt must not be empty"),
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PromptConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_fallback_response")]
    pub fallback_response: String,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_fallback_response() -> String {
    DEFAULT_FALLBACK_RESPONSE.to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            fallback_response: default_fallback_response(),
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        if self.system_prompt.trim().is_empty() {
            return Err(PromptError::EmptySystemPrompt);
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, PromptError> {
        let config: PromptConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Loads prompts from `path`, or the built-in persona when no path is given.
pub fn load_prompts(path: Option<&Path>) -> Result<PromptConfig, PromptError> {
    match path {
        Some(path) => {
            info!("Loading prompts from {}", path.display());
            let content = fs::read_to_string(path)?;
            PromptConfig::from_json(&content)
        }
        None => Ok(PromptConfig::default()),
    }
}
