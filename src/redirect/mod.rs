//! Redirect resolution and the access-password gate.
//!
//! # Data Flow
//! ```text
//! GET /{channel_id}/{...path}?query
//!     → resolver.rs (lookup record)
//!     → gate.rs (record gated? proof cookie matches access key?)
//!         → no proof: Challenge (HTML prompt, 200)
//!     → resolver.rs (scheme://host:port + path suffix + query)
//!     → Redirect (302)
//!
//! POST /api/verify
//!     → gate.rs (compare access key) → AccessProof (Set-Cookie)
//! ```
//!
//! # Design Decisions
//! - The gate runs before the target is computed, so an unproven client
//!   never sees the upstream address
//! - A proof is the access key itself; rotating the key revokes every proof

pub mod gate;
pub mod resolver;

pub use gate::{AccessGate, AccessProof, CookieJar};
pub use resolver::{RedirectResolver, Resolution};
