//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID span, cookies, JSON bodies)
//!     → handlers.rs
//!         /api/create | /api/update → channel registry
//!         /api/verify               → access gate
//!         /{channel_id}/...         → redirect resolver
//!         /, /register              → pages.rs
//!     → response.rs (status mapping, 302 Location)
//!     → Send to client
//! ```

pub mod handlers;
pub mod pages;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
