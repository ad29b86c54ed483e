//! Router configuration for the web API.

use axum::{
    body::Body,
    http::Request,
    middleware::{self, Next},
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    apply, chat_enabled_applications, chat_history, clear_chat, clear_chat_for_me, create_job,
    delete_message, get_application, get_job, list_job_applications, list_jobs,
    list_my_applications, login, logout, me, register, update_application_status, AppState,
};
use super::middleware::{
    api_rate_limit, create_cors_layer, jwt_auth, login_rate_limit, security_headers, JwtState,
    RateLimitState,
};
use super::ws::chat_ws_handler;

/// Create the complete router: `/health` plus everything under `/api`.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    let login_limit = rate_limit.clone();
    let auth_routes = Router::new()
        .route("/register", post(register))
        .route(
            "/login",
            post(login).layer(middleware::from_fn(
                move |req: Request<Body>, next: Next| {
                    login_rate_limit(login_limit.clone(), req, next)
                },
            )),
        )
        .route("/logout", post(logout))
        .route("/me", get(me));

    let chat_routes = Router::new()
        .route("/enabled", get(chat_enabled_applications))
        .route("/ws", get(chat_ws_handler))
        .route("/message/:message_id", axum::routing::delete(delete_message))
        .route("/:application_id", get(chat_history).delete(clear_chat))
        .route("/:application_id/clear-for-me", post(clear_chat_for_me));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/:id", get(get_job))
        .route("/jobs/:id/apply", post(apply))
        .route("/jobs/:id/applications", get(list_job_applications))
        .route("/applications", get(list_my_applications))
        .route("/applications/:id", get(get_application))
        .route("/applications/:id/status", patch(update_application_status))
        .nest("/chat", chat_routes)
        .layer(middleware::from_fn(move |req: Request<Body>, next: Next| {
            api_rate_limit(rate_limit.clone(), req, next)
        }));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers))
                .layer(middleware::from_fn(move |req: Request<Body>, next: Next| {
                    jwt_auth(jwt_state.clone(), req, next)
                })),
        )
        .with_state(app_state)
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
