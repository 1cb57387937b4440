//! Access gate for password-protected channels.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::collections::HashMap;
use std::sync::Arc;

use crate::channel::{credentials_match, ChannelRecord, ChannelRegistry};
use crate::config::schema::AccessConfig;
use crate::error::{ChannelError, ChannelResult};
use crate::observability::metrics;

/// Bytes that cannot appear raw in a cookie name or value.
const COOKIE_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b',')
    .add(b';')
    .add(b'=')
    .add(b'\\')
    .add(b'%');

/// Cookies sent by the client, names and values percent-decoded.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: HashMap<String, String>,
}

impl CookieJar {
    /// Parse a `Cookie` header: `;`-separated `name=value` pairs.
    ///
    /// Pairs with an empty name or value, or that do not decode to UTF-8,
    /// are skipped. A later duplicate overrides an earlier one.
    pub fn parse(header: &str) -> Self {
        let mut jar = Self::default();
        jar.extend_from(header);
        jar
    }

    /// Add the pairs of one more `Cookie` header.
    pub fn extend_from(&mut self, header: &str) {
        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            if name.is_empty() || value.is_empty() {
                continue;
            }
            let (Ok(name), Ok(value)) = (
                percent_decode_str(name).decode_utf8(),
                percent_decode_str(value).decode_utf8(),
            ) else {
                continue;
            };
            self.cookies.insert(name.into_owned(), value.into_owned());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Proof of a successful access-key verification, carried as a cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessProof {
    pub name: String,
    pub value: String,
    pub max_age_secs: u64,
}

impl AccessProof {
    /// The encoded `name=value` pair, as a client sends it back in `Cookie`.
    pub fn to_cookie_pair(&self) -> String {
        format!(
            "{}={}",
            utf8_percent_encode(&self.name, COOKIE_ENCODE_SET),
            utf8_percent_encode(&self.value, COOKIE_ENCODE_SET)
        )
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_set_cookie(&self) -> String {
        format!("{}; path=/; max-age={}", self.to_cookie_pair(), self.max_age_secs)
    }
}

/// Decides whether a request may pass a gated channel and issues proofs.
pub struct AccessGate {
    registry: Arc<ChannelRegistry>,
    cookie_prefix: String,
    max_age_secs: u64,
}

impl AccessGate {
    pub fn new(registry: Arc<ChannelRegistry>, config: &AccessConfig) -> Self {
        Self {
            registry,
            cookie_prefix: config.cookie_prefix.clone(),
            max_age_secs: config.cookie_max_age_secs,
        }
    }

    /// Name of the proof cookie for a channel, e.g. `access_abc`.
    pub fn cookie_name(&self, channel_id: &str) -> String {
        format!("{}{}", self.cookie_prefix, channel_id)
    }

    /// True if the record is public or the jar carries its current access key.
    pub fn is_proven(
        &self,
        channel_id: &str,
        record: &ChannelRecord,
        cookies: &CookieJar,
    ) -> bool {
        if !record.is_gated() {
            return true;
        }
        cookies
            .get(&self.cookie_name(channel_id))
            .map(|proof| credentials_match(&record.access_key, proof))
            .unwrap_or(false)
    }

    /// Check a supplied access key and issue a proof on success.
    pub async fn verify(&self, channel_id: &str, supplied: &str) -> ChannelResult<AccessProof> {
        if channel_id.is_empty() || supplied.is_empty() {
            metrics::record_mutation("verify", "invalid");
            return Err(ChannelError::InvalidRequest("Incomplete parameters".into()));
        }

        let record = self.registry.lookup(channel_id).await?.ok_or_else(|| {
            metrics::record_mutation("verify", "not_found");
            ChannelError::NotFound
        })?;

        if !credentials_match(&record.access_key, supplied) {
            tracing::warn!(channel_id = %channel_id, "Access key rejected");
            metrics::record_mutation("verify", "unauthorized");
            return Err(ChannelError::Unauthorized("Wrong access key"));
        }

        tracing::debug!(channel_id = %channel_id, "Access key verified");
        metrics::record_mutation("verify", "ok");
        Ok(AccessProof {
            name: self.cookie_name(channel_id),
            value: record.access_key,
            max_age_secs: self.max_age_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelForm, Port};
    use crate::resilience::StorePolicy;
    use crate::store::MemoryStore;

    async fn gate_with(access_key: &str) -> AccessGate {
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
        AccessGate::new(registry, &AccessConfig::default())
    }

    #[test]
    fn test_cookie_parsing() {
        let jar = CookieJar::parse("a=1; access_abc=s%20ecret ; empty=; =x; novalue; b=2=3");
        assert_eq!(jar.get("a"), Some("1"));
        assert_eq!(jar.get("access_abc"), Some("s ecret"));
        assert_eq!(jar.get("empty"), None);
        assert_eq!(jar.get("novalue"), None);
        assert_eq!(jar.get("b"), Some("2=3"));
    }

    #[test]
    fn test_cookie_parsing_skips_bad_utf8() {
        let jar = CookieJar::parse("bad=%FF%FE; good=%E6%B5%8B");
        assert_eq!(jar.get("bad"), None);
        assert_eq!(jar.get("good"), Some("测"));
    }

    #[test]
    fn test_later_duplicate_wins() {
        let mut jar = CookieJar::parse("k=first");
        jar.extend_from("k=second");
        assert_eq!(jar.get("k"), Some("second"));
    }

    #[test]
    fn test_set_cookie_rendering() {
        let proof = AccessProof {
            name: "access_abc".into(),
            value: "secret".into(),
            max_age_secs: 2_592_000,
        };
        assert_eq!(proof.to_set_cookie(), "access_abc=secret; path=/; max-age=2592000");

        let awkward = AccessProof {
            name: "access_测".into(),
            value: "a;b c".into(),
            max_age_secs: 60,
        };
        let rendered = awkward.to_set_cookie();
        let pair = rendered.split(';').next().unwrap();
        let jar = CookieJar::parse(pair);
        assert_eq!(jar.get("access_测"), Some("a;b c"));
    }

    #[test]
    fn test_cookie_pair_survives_reserved_characters() {
        let proof = AccessProof {
            name: "access_a=b".into(),
            value: "k;e=y%20".into(),
            max_age_secs: 0,
        };
        let pair = proof.to_cookie_pair();
        assert!(!pair.contains(';'));
        assert_eq!(pair.matches('=').count(), 1);

        let jar = CookieJar::parse(&format!("other=1; {}", pair));
        assert_eq!(jar.get("access_a=b"), Some("k;e=y%20"));
        assert!(proof.to_set_cookie().starts_with(&pair));
    }

    #[tokio::test]
    async fn test_public_channel_needs_no_proof() {
        let gate = gate_with("").await;
        let record = gate.registry.lookup("abc").await.unwrap().unwrap();
        assert!(gate.is_proven("abc", &record, &CookieJar::default()));
    }

    #[tokio::test]
    async fn test_verify_and_prove() {
        let gate = gate_with("secret").await;
        let record = gate.registry.lookup("abc").await.unwrap().unwrap();
        assert!(!gate.is_proven("abc", &record, &CookieJar::default()));
        assert!(!gate.is_proven("abc", &record, &CookieJar::parse("access_abc=wrong")));

        let proof = gate.verify("abc", "secret").await.unwrap();
        assert_eq!(proof.name, "access_abc");
        assert_eq!(proof.value, "secret");
        assert_eq!(proof.max_age_secs, 2_592_000);

        let jar = CookieJar::parse(&proof.to_set_cookie());
        assert!(gate.is_proven("abc", &record, &jar));
    }

    #[tokio::test]
    async fn test_verify_failures() {
        let gate = gate_with("secret").await;
        assert!(matches!(
            gate.verify("abc", "").await,
            Err(ChannelError::InvalidRequest(_))
        ));
        assert!(matches!(
            gate.verify("", "secret").await,
            Err(ChannelError::InvalidRequest(_))
        ));
        assert!(matches!(
            gate.verify("nobody", "secret").await,
            Err(ChannelError::NotFound)
        ));
        assert!(matches!(
            gate.verify("abc", "guess").await,
            Err(ChannelError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_on_public_channel_fails() {
        let gate = gate_with("").await;
        assert!(matches!(
            gate.verify("abc", "anything").await,
            Err(ChannelError::Unauthorized(_))
        ));
    }
}
