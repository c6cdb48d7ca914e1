use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::registry::TenantRealm;

const DEFAULT_CLOCK_SKEW_SECS: u64 = 300;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 5;
const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_MIN_JWKS_RELOAD_SECS: u64 = 30;

/// Maximum accepted size of a compact token, checked before any decoding
pub const DEFAULT_MAX_TOKEN_BYTES: usize = 8192;

/// Header reserved for the internally asserted subject identity
pub const AUTH_SUBJECT_HEADER: &str = "x-auth-subject";

/// Header the mesh carries the signed token in
pub const JWT_ASSERTION_HEADER: &str = "x-jwt-assertion";

/// Configuration for the token validation pipeline
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Realm every trust lookup is scoped by
    pub(crate) realm: TenantRealm,
    /// Tolerance added to the current time for exp / nbf checks
    pub(crate) clock_skew: Duration,
    /// Deadline applied to each registry or verifier call
    pub(crate) call_timeout: Duration,
    pub(crate) max_token_bytes: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            realm: TenantRealm::default(),
            clock_skew: Duration::from_secs(DEFAULT_CLOCK_SKEW_SECS),
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            max_token_bytes: DEFAULT_MAX_TOKEN_BYTES,
        }
    }
}

impl ValidatorConfig {
    /// Create a configuration scoped to the given realm with default skew and timeouts
    pub fn new(realm: TenantRealm) -> Self {
        Self {
            realm,
            ..Self::default()
        }
    }

    /// Set the clock skew tolerance
    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew;
        self
    }

    /// Set the per-call deadline for registry lookups and signature verification
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_max_token_bytes(mut self, max: usize) -> Self {
        self.max_token_bytes = max;
        self
    }

    pub fn realm(&self) -> &TenantRealm {
        &self.realm
    }
}

/// Configuration for the bundled JWKS signature verifier
#[derive(Debug, Clone)]
pub struct JwksVerifierConfig {
    /// Time-to-live for cached JWKS (default: 1 hour)
    pub(crate) jwks_cache_ttl: Duration,
    /// Minimum age of a cached set before an unknown `kid` may trigger a reload
    pub(crate) min_reload_interval: Duration,
    /// Optional custom HTTP client for fetching JWKS
    /// If not provided, a default client will be created
    pub(crate) http_client: Option<Client>,
}

impl Default for JwksVerifierConfig {
    fn default() -> Self {
        Self {
            jwks_cache_ttl: Duration::from_secs(DEFAULT_JWKS_CACHE_TTL_SECS),
            min_reload_interval: Duration::from_secs(DEFAULT_MIN_JWKS_RELOAD_SECS),
            http_client: None,
        }
    }
}

impl JwksVerifierConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the JWKS cache TTL
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.jwks_cache_ttl = ttl;
        self
    }

    /// Set how long a freshly loaded key set is trusted to be complete
    pub fn with_min_reload_interval(mut self, interval: Duration) -> Self {
        self.min_reload_interval = interval;
        self
    }

    /// Set a custom HTTP client
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

/// Regular expressions of routes exempt from authentication.
///
/// Loaded once per process by the caller (from any serde format) and handed
/// to [`PathAuthPolicy::new`](crate::PathAuthPolicy::new).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct UnprotectedPaths(Vec<String>);

impl UnprotectedPaths {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(patterns.into_iter().map(Into::into).collect())
    }

    pub fn patterns(&self) -> &[String] {
        &self.0
    }
}

/// Header names used at the mediation boundary
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Header that must never arrive from outside the trust boundary
    pub subject_header: String,
    /// Header carrying the signed token
    pub assertion_header: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            subject_header: AUTH_SUBJECT_HEADER.to_string(),
            assertion_header: JWT_ASSERTION_HEADER.to_string(),
        }
    }
}
