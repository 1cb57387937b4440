//! Named-channel HTTP redirector library.
//!
//! A channel id is bound to a target host/port; requests to
//! `/{channel_id}/...` are redirected there with path and query preserved,
//! optionally behind an access password.

pub mod channel;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod redirect;
pub mod resilience;
pub mod store;

pub use channel::{ChannelRecord, ChannelRegistry};
pub use config::RedirectorConfig;
pub use error::ChannelError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use redirect::{AccessGate, RedirectResolver, Resolution};
pub use store::RecordStore;
