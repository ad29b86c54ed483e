//! Web server for HireOn.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::chat::{ChatService, IdentityVerifier, MessageRelay};
use crate::config::Config;
use crate::{Database, HireonError, Result};

use super::handlers::AppState;
use super::middleware::{JwtState, RateLimitState};
use super::router::create_router;

/// HTTP and WebSocket server.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Wire the chat service, token handling and rate limiting to a database.
    pub fn new(config: &Config, db: &Database) -> Result<Self> {
        let web = &config.web;
        let addr: SocketAddr = format!("{}:{}", web.host, web.port)
            .parse()
            .map_err(|e| HireonError::Config(format!("invalid web server address: {e}")))?;

        let jwt_state = Arc::new(JwtState::new(&web.jwt_secret, &web.cookie_name));
        let verifier: Arc<dyn IdentityVerifier> = jwt_state.clone();
        let chat = ChatService::new(
            db.pool().clone(),
            Arc::new(MessageRelay::new()),
            verifier,
            config.chat.clone(),
        );

        let app_state = AppState::new(
            db.pool().clone(),
            &web.jwt_secret,
            web.jwt_access_token_expiry_secs,
            &web.cookie_name,
            chat,
        );

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            jwt_state,
            rate_limit: Arc::new(RateLimitState::new(
                web.login_rate_limit,
                web.api_rate_limit,
            )),
            cors_origins: web.cors_origins.clone(),
        })
    }

    /// Configured listen address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn chat(&self) -> &ChatService {
        &self.app_state.chat
    }

    /// Build the application router.
    pub fn router(&self) -> Router {
        create_router(
            self.app_state.clone(),
            self.jwt_state.clone(),
            self.rate_limit.clone(),
            &self.cors_origins,
        )
        .layer(CompressionLayer::new())
    }

    async fn bind(&self) -> std::io::Result<(TcpListener, SocketAddr)> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        self.rate_limit.clone().start_cleanup_task();
        tracing::info!("Web server listening on http://{}", local_addr);
        Ok((listener, local_addr))
    }

    /// Run the server until it fails.
    pub async fn run(self) -> std::io::Result<()> {
        let router = self.router();
        let (listener, _) = self.bind().await?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    /// Start the server in the background and return the bound address.
    ///
    /// Bind to port 0 to get a free port.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let router = self.router();
        let (listener, local_addr) = self.bind().await?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.web.host = "127.0.0.1".to_string();
        config.web.port = 0;
        config.web.jwt_secret = "test-secret-key".to_string();
        config
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let db = Database::open_in_memory().await.unwrap();
        let server = WebServer::new(&test_config(), &db).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_invalid_address_is_config_error() {
        let db = Database::open_in_memory().await.unwrap();
        let mut config = test_config();
        config.web.host = "not an address".to_string();
        assert!(matches!(
            WebServer::new(&config, &db),
            Err(HireonError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_run_with_addr_serves_health() {
        let db = Database::open_in_memory().await.unwrap();
        let server = WebServer::new(&test_config(), &db).unwrap();
        let addr = server.run_with_addr().await.unwrap();
        assert_ne!(addr.port(), 0);

        let stream = tokio::net::TcpStream::connect(addr).await;
        assert!(stream.is_ok());
    }
}
