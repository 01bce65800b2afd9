pub mod api;

use crate::agent::ChatAgent;
use crate::cli::Args;
use api::AppState;
use axum::Router;
use axum::http::{ header, HeaderValue, Method };
use log::{ info, warn };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{ AllowOrigin, Any, CorsLayer };
use tower_http::services::{ ServeDir, ServeFile };

pub struct Server {
    agent: Arc<ChatAgent>,
    args: Args,
}

impl Server {
    pub fn new(agent: Arc<ChatAgent>, args: Args) -> Self {
        Self { agent, args }
    }

    /// Full application: API under `/api`, the built widget everywhere else.
    pub fn app(&self) -> Router {
        let state = AppState::new(self.agent.clone(), self.args.app_env.clone());
        let index = self.args.static_dir.join("index.html");
        let widget = ServeDir::new(&self.args.static_dir).fallback(ServeFile::new(index));

        Router::new()
            .nest("/api", api::router(state))
            .fallback_service(widget)
            .layer(cors_layer(&self.args.cors_origins))
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.args.server_addr.parse::<SocketAddr>()?;
        let app = self.app();

        match (self.args.enable_tls, &self.args.tls_cert_path, &self.args.tls_key_path) {
            (true, Some(cert_path), Some(key_path)) => {
                let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                    cert_path,
                    key_path
                ).await?;

                let handle = axum_server::Handle::new();
                let shutdown = handle.clone();
                tokio::spawn(async move {
                    shutdown_signal().await;
                    shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
                });

                info!("Serving HTTPS on https://{}", addr);
                axum_server::bind_rustls(addr, tls_config)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await?;
            }
            (true, _, _) => {
                return Err("ENABLE_TLS requires both TLS_CERT_PATH and TLS_KEY_PATH".into());
            }
            _ => {
                let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                    format!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e)
                })?;
                info!("Serving HTTP on http://{}", addr);
                axum::serve(listener, app.into_make_service())
                    .with_graceful_shutdown(shutdown_signal())
                    .await?;
            }
        }

        info!("Server stopped");
        Ok(())
    }
}

/// `*` opens the API to any origin; browsers refuse credentials with a
/// wildcard, so they are only allowed for an explicit origin list.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.iter().any(|o| o.trim() == "*") {
        info!("CORS open to any origin, credentials disabled");
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    base
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, shutting down gracefully...");
}
