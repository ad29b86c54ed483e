//! Web API for HireOn.
//!
//! REST endpoints for accounts, jobs, applications and chat, plus the
//! WebSocket channel that relays chat events in real time.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod ws;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
