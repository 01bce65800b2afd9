pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod models;
pub mod server;

use agent::ChatAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Environment: {}", args.app_env);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Chat API Key: {}", if args.chat_api_key.is_empty() { "missing" } else { "loaded" });
    info!("Temperature / Max Tokens: {} / {}", args.chat_temperature, args.chat_max_tokens);
    info!("History Window: {} turns ({} trim)", args.history_max_turns, args.history_trim);
    info!("Static Dir: {}", args.static_dir.display());
    info!("CORS Origins: {}", args.cors_origins.join(", "));
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let agent = Arc::new(ChatAgent::from_args(&args)?);
    info!("Starting server on: {}", args.server_addr);
    let server = Server::new(agent, args);
    server.run().await?;

    Ok(())
}
