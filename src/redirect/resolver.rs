//! Redirect target resolution.
//!
//! # Responsibilities
//! - Look up the channel named by the first path segment
//! - Consult the access gate for password-protected channels
//! - Build `{scheme}://{host}:{port}{suffix}{query}`
//!
//! # Design Decisions
//! - The suffix is the request path minus its first segment; a bare `/`
//!   suffix collapses to nothing
//! - The query string passes through untouched; an empty query adds no `?`
//! - Segments are matched raw; only the store lookup uses the decoded id

use percent_encoding::percent_decode_str;
use std::sync::Arc;

use super::gate::{AccessGate, CookieJar};
use crate::channel::{ChannelRecord, ChannelRegistry};
use crate::error::ChannelResult;
use crate::observability::metrics;

/// Outcome of resolving a channel request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Send a 302 to this URL.
    Redirect(String),
    /// The channel is gated and the request carries no valid proof.
    Challenge { channel_id: String },
    NotFound,
}

/// Split a raw request path into its decoded first segment and the rest.
///
/// `/abc/foo/bar` → `("abc", "/foo/bar")`; `/abc` and `/abc/` → `("abc", "")`.
/// Returns `None` when the path has no non-empty segment.
pub fn split_channel_path(path: &str) -> Option<(String, &str)> {
    let rest = path.trim_start_matches('/');
    let (segment, suffix) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };
    if segment.is_empty() {
        return None;
    }
    let channel_id = percent_decode_str(segment).decode_utf8_lossy().into_owned();
    let suffix = if suffix == "/" { "" } else { suffix };
    Some((channel_id, suffix))
}

/// Build the outbound URL for a record.
pub fn build_target(record: &ChannelRecord, suffix: &str, query: Option<&str>) -> String {
    let mut target = format!(
        "{}://{}:{}{}",
        record.scheme(),
        record.host,
        record.port,
        suffix
    );
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(query);
    }
    target
}

/// Resolves inbound channel paths to redirect targets.
pub struct RedirectResolver {
    registry: Arc<ChannelRegistry>,
    gate: Arc<AccessGate>,
}

impl RedirectResolver {
    pub fn new(registry: Arc<ChannelRegistry>, gate: Arc<AccessGate>) -> Self {
        Self { registry, gate }
    }

    /// Resolve a request for `channel_id`.
    ///
    /// `request_path` is the full raw path (including the channel segment)
    /// and `query` the raw query string without its `?`.
    pub async fn resolve(
        &self,
        channel_id: &str,
        request_path: &str,
        query: Option<&str>,
        cookies: &CookieJar,
    ) -> ChannelResult<Resolution> {
        let Some(record) = self.registry.lookup(channel_id).await? else {
            tracing::debug!(channel_id = %channel_id, "Unknown channel");
            metrics::record_redirect("not_found");
            return Ok(Resolution::NotFound);
        };

        if !self.gate.is_proven(channel_id, &record, cookies) {
            tracing::debug!(channel_id = %channel_id, "Access proof missing, serving challenge");
            metrics::record_redirect("challenge");
            return Ok(Resolution::Challenge {
                channel_id: channel_id.to_string(),
            });
        }

        let suffix = split_channel_path(request_path)
            .map(|(_, suffix)| suffix)
            .unwrap_or("");
        let target = build_target(&record, suffix, query);

        tracing::debug!(channel_id = %channel_id, "Resolved redirect");
        metrics::record_redirect("redirect");
        Ok(Resolution::Redirect(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelForm, Port};
    use crate::config::schema::AccessConfig;
    use crate::resilience::StorePolicy;
    use crate::store::MemoryStore;

    fn record(https: bool, port: Port) -> ChannelRecord {
        ChannelRecord {
            password: "p".into(),
            https,
            host: "10.0.0.5".into(),
            port,
            access_key: String::new(),
        }
    }

    async fn resolver_with(access_key: &str) -> RedirectResolver {
        let registry = Arc::new(ChannelRegistry::new(
            Arc::new(MemoryStore::new()),
            StorePolicy::default(),
        ));
        registry
            .create(ChannelForm {
                channel_id: "abc".into(),
                password: "p".into(),
                host: "10.0.0.5".into(),
                port: Port::from("8080"),
                https: false,
                access_key: access_key.into(),
            })
            .await
            .unwrap();
        let gate = Arc::new(AccessGate::new(registry.clone(), &AccessConfig::default()));
        RedirectResolver::new(registry, gate)
    }

    #[test]
    fn test_split_channel_path() {
        assert_eq!(split_channel_path("/abc/foo"), Some(("abc".into(), "/foo")));
        assert_eq!(split_channel_path("/abc"), Some(("abc".into(), "")));
        assert_eq!(split_channel_path("/abc/"), Some(("abc".into(), "")));
        assert_eq!(split_channel_path("/abc/foo/"), Some(("abc".into(), "/foo/")));
        assert_eq!(split_channel_path("/abc//x"), Some(("abc".into(), "//x")));
        assert_eq!(
            split_channel_path("/%E6%B5%8B/a%20b"),
            Some(("测".into(), "/a%20b"))
        );
        assert_eq!(split_channel_path("/"), None);
        assert_eq!(split_channel_path(""), None);
    }

    #[test]
    fn test_build_target() {
        let plain = record(false, Port::from("8080"));
        assert_eq!(
            build_target(&plain, "/foo", Some("x=1")),
            "http://10.0.0.5:8080/foo?x=1"
        );
        assert_eq!(build_target(&plain, "", None), "http://10.0.0.5:8080");
        assert_eq!(build_target(&plain, "", Some("")), "http://10.0.0.5:8080");

        let secure = record(true, Port::Number(443));
        assert_eq!(
            build_target(&secure, "/a/b", Some("q=%20&r")),
            "https://10.0.0.5:443/a/b?q=%20&r"
        );
    }

    #[tokio::test]
    async fn test_round_trip_redirect() {
        let resolver = resolver_with("").await;
        let jar = CookieJar::default();
        assert_eq!(
            resolver.resolve("abc", "/abc/foo", Some("x=1"), &jar).await.unwrap(),
            Resolution::Redirect("http://10.0.0.5:8080/foo?x=1".into())
        );
        assert_eq!(
            resolver.resolve("abc", "/abc", None, &jar).await.unwrap(),
            Resolution::Redirect("http://10.0.0.5:8080".into())
        );
        assert_eq!(
            resolver.resolve("abc", "/abc/", None, &jar).await.unwrap(),
            Resolution::Redirect("http://10.0.0.5:8080".into())
        );
    }

    #[tokio::test]
    async fn test_unknown_channel() {
        let resolver = resolver_with("").await;
        assert_eq!(
            resolver
                .resolve("nobody", "/nobody", None, &CookieJar::default())
                .await
                .unwrap(),
            Resolution::NotFound
        );
    }

    #[tokio::test]
    async fn test_gate_bypass() {
        let resolver = resolver_with("secret").await;
        let challenge = Resolution::Challenge {
            channel_id: "abc".into(),
        };

        let none = CookieJar::default();
        assert_eq!(resolver.resolve("abc", "/abc/x", None, &none).await.unwrap(), challenge);

        let wrong = CookieJar::parse("access_abc=wrong");
        assert_eq!(resolver.resolve("abc", "/abc/x", None, &wrong).await.unwrap(), challenge);

        let other_channel = CookieJar::parse("access_abd=secret");
        assert_eq!(
            resolver.resolve("abc", "/abc/x", None, &other_channel).await.unwrap(),
            challenge
        );

        let proof = resolver.gate.verify("abc", "secret").await.unwrap();
        let jar = CookieJar::parse(&format!("{}={}", proof.name, proof.value));
        assert_eq!(
            resolver.resolve("abc", "/abc/x", None, &jar).await.unwrap(),
            Resolution::Redirect("http://10.0.0.5:8080/x".into())
        );
    }
}
