use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use jsonwebtoken::jwk::JwkSet;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

use crate::error::fetch_jwks_error;
use crate::error::openid_jwks_error;
use crate::error::Error;
use crate::error::Result;

const OPENID_CONFIGURATION_PATH: &str = "/.well-known/openid-configuration";

#[derive(Debug, Deserialize)]
struct OpenIdConfig {
    jwks_uri: String,
}

/// Where a provider publishes its signing keys
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum JwksSource {
    /// JWKS endpoint configured on the provider
    Uri(String),
    /// Issuer whose OpenID configuration names the JWKS endpoint
    Discovery(String),
}

impl JwksSource {
    fn as_str(&self) -> &str {
        match self {
            JwksSource::Uri(uri) => uri,
            JwksSource::Discovery(issuer) => issuer,
        }
    }
}

struct KeySetEntry {
    keys: Arc<JwkSet>,
    loaded_at: Instant,
}

/// Key sets per source, each kept until its TTL runs out.
///
/// At most one download per source is in flight; concurrent callers wait for
/// it and share the result.
pub(crate) struct JwksCache {
    entries: RwLock<HashMap<JwksSource, KeySetEntry>>,
    loads: Mutex<HashMap<JwksSource, Arc<Mutex<()>>>>,
    ttl: Duration,
    min_reload_interval: Duration,
    client: Client,
}

impl JwksCache {
    pub(crate) fn new(ttl: Duration, min_reload_interval: Duration, client: Client) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            loads: Mutex::new(HashMap::new()),
            ttl,
            min_reload_interval: min_reload_interval.min(ttl),
            client,
        }
    }

    /// Key set for `source`; served from memory while unexpired
    pub(crate) async fn key_set(&self, source: &JwksSource) -> Result<Arc<JwkSet>> {
        if let Some(keys) = self.cached(source, self.ttl).await {
            return Ok(keys);
        }

        let lock = self.load_lock(source).await;
        let _guard = lock.lock().await;
        // loaded by another caller while we waited
        if let Some(keys) = self.cached(source, self.ttl).await {
            return Ok(keys);
        }
        self.load(source).await
    }

    /// Reload after a key id was not found in the cached set.
    ///
    /// A set loaded less than `min_reload_interval` ago is returned without
    /// fetching.
    pub(crate) async fn reload_after_miss(&self, source: &JwksSource) -> Result<Arc<JwkSet>> {
        let lock = self.load_lock(source).await;
        let _guard = lock.lock().await;

        if let Some(keys) = self.cached(source, self.min_reload_interval).await {
            tracing::debug!(source = source.as_str(), "JWKS loaded recently, not reloading");
            return Ok(keys);
        }
        self.load(source).await
    }

    async fn cached(&self, source: &JwksSource, max_age: Duration) -> Option<Arc<JwkSet>> {
        let entries = self.entries.read().await;
        let entry = entries.get(source)?;
        (entry.loaded_at.elapsed() < max_age).then(|| Arc::clone(&entry.keys))
    }

    async fn load_lock(&self, source: &JwksSource) -> Arc<Mutex<()>> {
        let mut loads = self.loads.lock().await;
        Arc::clone(loads.entry(source.clone()).or_default())
    }

    async fn load(&self, source: &JwksSource) -> Result<Arc<JwkSet>> {
        let keys = Arc::new(self.download(source).await?);
        tracing::debug!(source = source.as_str(), keys = keys.keys.len(), "JWKS loaded");

        self.entries.write().await.insert(
            source.clone(),
            KeySetEntry {
                keys: Arc::clone(&keys),
                loaded_at: Instant::now(),
            },
        );
        Ok(keys)
    }

    async fn download(&self, source: &JwksSource) -> Result<JwkSet> {
        let jwks_uri = match source {
            JwksSource::Uri(uri) => uri.clone(),
            JwksSource::Discovery(issuer) => {
                let url = format!(
                    "{}{OPENID_CONFIGURATION_PATH}",
                    issuer.trim_end_matches('/')
                );
                let config: OpenIdConfig = self.get_json(&url, openid_jwks_error).await?;
                config.jwks_uri
            }
        };

        self.get_json(&jwks_uri, fetch_jwks_error).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        on_error: fn(reqwest::Error) -> Error,
    ) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(on_error)?;

        response.json().await.map_err(on_error)
    }
}
