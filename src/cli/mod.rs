use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (groq, openai, ollama)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "groq")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., https://api.groq.com/openai/v1)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let the client pick the provider default
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider
    #[arg(long, env = "CHAT_API_KEY", default_value = "", hide_env_values = true)]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., llama-3.3-70b-versatile)
    #[arg(long, env = "CHAT_MODEL")]
    pub chat_model: Option<String>,

    /// Sampling temperature for chat completion.
    #[arg(long, env = "CHAT_TEMPERATURE", default_value = "0.7")]
    pub chat_temperature: f32,

    /// Maximum number of tokens the provider may generate per reply.
    #[arg(long, env = "CHAT_MAX_TOKENS", default_value = "1024")]
    pub chat_max_tokens: u32,

    /// Optional JSON file overriding the system prompt and fallback reply.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<PathBuf>,

    // --- History Args ---
    /// Number of most recent turns kept per conversation (at least one exchange).
    #[arg(
        long,
        env = "HISTORY_MAX_TURNS",
        default_value = "20",
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(2..)
    )]
    pub history_max_turns: usize,

    /// How history is trimmed past the cap (turns, pairs).
    #[arg(long, env = "HISTORY_TRIM", default_value = "turns")]
    pub history_trim: String,

    // --- Server Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:3001")]
    pub server_addr: String,

    /// Directory holding the built chat widget.
    #[arg(long, env = "STATIC_DIR", default_value = "dist")]
    pub static_dir: PathBuf,

    /// Comma separated list of origins allowed to call the API from a browser.
    #[arg(
        long,
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173,http://localhost:3001"
    )]
    pub cors_origins: Vec<String>,

    /// Deployment environment name. "development" adds failure details to error responses.
    #[arg(long, env = "APP_ENV", default_value = "production")]
    pub app_env: String,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
