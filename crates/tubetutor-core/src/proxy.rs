//! Egress proxy pool
//!
//! Transcript requests are rate limited per source address, so every fetch
//! attempt is routed through a proxy drawn at random from this pool.

use rand::seq::IndexedRandom;
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

use crate::retry::IdentitySource;

/// Errors raised while building the proxy pool
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The configuration produced no usable proxy entry
    #[error("no valid proxies configured ({rejected} entries rejected)")]
    NoValidProxies {
        /// Number of malformed entries that were skipped
        rejected: usize,
    },
}

/// An authenticated egress proxy
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyIdentity {
    host: String,
    port: u16,
    username: String,
    password: String,
}

impl ProxyIdentity {
    /// Parse a single `host:port:user:pass` entry.
    ///
    /// Returns `None` unless the entry has exactly four non-empty fields and
    /// a numeric port.
    #[must_use]
    pub fn parse(entry: &str) -> Option<Self> {
        let fields: Vec<&str> = entry.split(':').map(str::trim).collect();
        let [host, port, username, password] = fields.as_slice() else {
            return None;
        };
        if [host, port, username, password].iter().any(|f| f.is_empty()) {
            return None;
        }
        Some(Self {
            host: (*host).to_string(),
            port: port.parse().ok()?,
            username: (*username).to_string(),
            password: (*password).to_string(),
        })
    }

    /// Proxy host
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Proxy port
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Proxy username
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Proxy password
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Proxy URL without credentials, e.g. `http://10.0.0.1:8080`
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

// Credentials stay out of logs
impl fmt::Display for ProxyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.host, self.port, self.username)
    }
}

impl fmt::Debug for ProxyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyIdentity")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[MASKED]")
            .finish()
    }
}

/// Immutable, non-empty set of egress proxies
#[derive(Debug, Clone)]
pub struct ProxyPool {
    identities: Vec<ProxyIdentity>,
}

impl ProxyPool {
    /// Build a pool from a configuration string.
    ///
    /// Entries are separated by commas, semicolons or whitespace. Malformed
    /// entries are logged and skipped; the pool is only rejected when
    /// nothing valid remains.
    ///
    /// # Examples
    ///
    /// ```
    /// use tubetutor_core::proxy::ProxyPool;
    ///
    /// let pool = ProxyPool::parse("10.0.0.1:8080:alice:secret, broken").unwrap();
    /// assert_eq!(pool.len(), 1);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::NoValidProxies` if every entry is malformed.
    pub fn parse(config: &str) -> Result<Self, ProxyError> {
        let mut identities = Vec::new();
        let mut rejected = 0;

        for (index, entry) in config
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .enumerate()
        {
            match ProxyIdentity::parse(entry) {
                Some(identity) => identities.push(identity),
                None => {
                    rejected += 1;
                    // Only the host part: the entry may contain a password
                    let host = entry.split(':').next().unwrap_or_default();
                    warn!(
                        entry = index,
                        host, "Skipping malformed proxy entry (expected host:port:user:pass)"
                    );
                }
            }
        }

        if identities.is_empty() {
            return Err(ProxyError::NoValidProxies { rejected });
        }

        info!(
            "Proxy pool ready: {} proxies ({} rejected)",
            identities.len(),
            rejected
        );
        Ok(Self { identities })
    }

    /// Pick a proxy uniformly at random
    #[must_use]
    pub fn select(&self) -> ProxyIdentity {
        self.identities
            .choose(&mut rand::rng())
            .unwrap_or(&self.identities[0])
            .clone()
    }

    /// Number of proxies in the pool
    #[must_use]
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Always false: construction rejects empty pools
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// All proxies in configuration order
    #[must_use]
    pub fn identities(&self) -> &[ProxyIdentity] {
        &self.identities
    }
}

impl IdentitySource for ProxyPool {
    type Identity = ProxyIdentity;

    fn select(&self) -> ProxyIdentity {
        Self::select(self)
    }
}
