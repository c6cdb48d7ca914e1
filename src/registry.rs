//! Identity-provider registry seam
//!
//! The registry owns identity-provider and application records. This crate
//! only queries it, scoped by a [`TenantRealm`], and never mutates what it
//! receives. [`InMemoryTrustRegistry`] is a ready-made backend for embedding
//! and tests; production deployments implement [`TrustRegistry`] over their
//! own store.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::Result;

/// Authenticator type name of the OpenID Connect federated authenticator.
pub const OIDC_AUTHENTICATOR: &str = "OIDC";

/// OIDC authenticator property holding the provider's issuer / entity id.
pub const IDP_ENTITY_ID: &str = "IdPEntityId";

/// OIDC authenticator property holding the provider's JWKS endpoint.
pub const JWKS_URI: &str = "jwksUri";

/// Realm used when nothing more specific is configured.
pub const DEFAULT_REALM: &str = "carbon.super";

/// Tenant / domain under which identity providers are registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct TenantRealm(String);

impl TenantRealm {
    pub fn new(realm: impl Into<String>) -> Self {
        Self(realm.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TenantRealm {
    fn default() -> Self {
        Self::new(DEFAULT_REALM)
    }
}

impl fmt::Display for TenantRealm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Configuration of one federated authenticator attached to a provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FederatedAuthenticatorConfig {
    /// Authenticator type, e.g. [`OIDC_AUTHENTICATOR`]
    pub name: String,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl FederatedAuthenticatorConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// A trusted token issuer as recorded in the registry.
///
/// Key material stays in the external trust store; it is referenced by
/// provider name and realm only.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityProvider {
    pub name: String,
    #[serde(default)]
    pub federated_authenticators: Vec<FederatedAuthenticatorConfig>,
}

impl IdentityProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            federated_authenticators: Vec::new(),
        }
    }

    pub fn with_authenticator(mut self, config: FederatedAuthenticatorConfig) -> Self {
        self.federated_authenticators.push(config);
        self
    }

    /// Find a federated authenticator by type name
    pub fn authenticator(&self, name: &str) -> Option<&FederatedAuthenticatorConfig> {
        self.federated_authenticators
            .iter()
            .find(|config| config.name == name)
    }

    /// Read a property of the OIDC authenticator, if configured
    pub fn oidc_property(&self, key: &str) -> Option<&str> {
        self.authenticator(OIDC_AUTHENTICATOR)?.property(key)
    }

    /// The issuer string this provider signs tokens as
    pub fn entity_id(&self) -> Option<&str> {
        self.oidc_property(IDP_ENTITY_ID)
    }
}

/// A registered OAuth application (client)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Application {
    pub client_key: String,
    pub name: String,
}

/// Outcome of an issuer lookup.
///
/// Replaces the registry convention of answering "no match" with a
/// placeholder provider named `default`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderLookup {
    Found(IdentityProvider),
    NotFound,
}

/// Trait for the external identity-provider registry
///
/// Lookups may be slow; callers bound them with a deadline.
#[async_trait]
pub trait TrustRegistry: Send + Sync {
    /// Look up a provider registered under exactly `issuer` within `realm`
    async fn find_provider_by_issuer(
        &self,
        issuer: &str,
        realm: &TenantRealm,
    ) -> Result<ProviderLookup>;

    /// Fetch the realm's resident (local) identity provider.
    ///
    /// `Ok(None)` means the realm has none configured; only backend failures
    /// are errors.
    async fn find_resident_provider(&self, realm: &TenantRealm)
        -> Result<Option<IdentityProvider>>;

    /// Resolve a consumer key to its registered application
    async fn find_application_by_client_key(&self, client_key: &str)
        -> Result<Option<Application>>;
}

#[derive(Default)]
struct RegistryState {
    providers: HashMap<(TenantRealm, String), IdentityProvider>,
    residents: HashMap<TenantRealm, IdentityProvider>,
    applications: HashMap<String, Application>,
}

/// Registry kept in process memory
#[derive(Clone, Default)]
pub struct InMemoryTrustRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl InMemoryTrustRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an external provider; its name is the issuer it is found by
    pub async fn add_provider(&self, realm: TenantRealm, provider: IdentityProvider) {
        let mut state = self.state.write().await;
        state
            .providers
            .insert((realm, provider.name.clone()), provider);
    }

    pub async fn set_resident_provider(&self, realm: TenantRealm, provider: IdentityProvider) {
        self.state.write().await.residents.insert(realm, provider);
    }

    pub async fn add_application(&self, application: Application) {
        let mut state = self.state.write().await;
        state
            .applications
            .insert(application.client_key.clone(), application);
    }
}

#[async_trait]
impl TrustRegistry for InMemoryTrustRegistry {
    async fn find_provider_by_issuer(
        &self,
        issuer: &str,
        realm: &TenantRealm,
    ) -> Result<ProviderLookup> {
        let state = self.state.read().await;
        let found = state.providers.get(&(realm.clone(), issuer.to_string()));

        Ok(match found {
            Some(provider) => ProviderLookup::Found(provider.clone()),
            None => ProviderLookup::NotFound,
        })
    }

    async fn find_resident_provider(
        &self,
        realm: &TenantRealm,
    ) -> Result<Option<IdentityProvider>> {
        Ok(self.state.read().await.residents.get(realm).cloned())
    }

    async fn find_application_by_client_key(
        &self,
        client_key: &str,
    ) -> Result<Option<Application>> {
        Ok(self.state.read().await.applications.get(client_key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oidc_provider(name: &str, entity_id: &str) -> IdentityProvider {
        IdentityProvider::new(name).with_authenticator(
            FederatedAuthenticatorConfig::new(OIDC_AUTHENTICATOR)
                .with_property(IDP_ENTITY_ID, entity_id),
        )
    }

    #[test]
    fn entity_id_reads_oidc_authenticator_only() {
        let provider = IdentityProvider::new("LOCAL")
            .with_authenticator(
                FederatedAuthenticatorConfig::new("SAML").with_property(IDP_ENTITY_ID, "saml-id"),
            )
            .with_authenticator(
                FederatedAuthenticatorConfig::new(OIDC_AUTHENTICATOR)
                    .with_property(IDP_ENTITY_ID, "https://sts.local"),
            );

        assert_eq!(provider.entity_id(), Some("https://sts.local"));
        assert_eq!(IdentityProvider::new("bare").entity_id(), None);
    }

    #[tokio::test]
    async fn lookups_are_scoped_by_realm() {
        let registry = InMemoryTrustRegistry::new();
        registry
            .add_provider(TenantRealm::new("a.com"), oidc_provider("idp-a", "idp-a"))
            .await;

        let hit = registry
            .find_provider_by_issuer("idp-a", &TenantRealm::new("a.com"))
            .await
            .unwrap();
        assert!(matches!(hit, ProviderLookup::Found(p) if p.name == "idp-a"));

        let miss = registry
            .find_provider_by_issuer("idp-a", &TenantRealm::new("b.com"))
            .await
            .unwrap();
        assert_eq!(miss, ProviderLookup::NotFound);
    }

    #[tokio::test]
    async fn missing_resident_provider_is_none() {
        let registry = InMemoryTrustRegistry::new();
        let result = registry.find_resident_provider(&TenantRealm::default()).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn applications_resolve_by_client_key() {
        let registry = InMemoryTrustRegistry::new();
        registry
            .add_application(Application {
                client_key: "key-1".into(),
                name: "orders".into(),
            })
            .await;

        let app = registry.find_application_by_client_key("key-1").await.unwrap();
        assert_eq!(app.map(|a| a.name), Some("orders".to_string()));
        assert!(registry
            .find_application_by_client_key("other")
            .await
            .unwrap()
            .is_none());
    }
}
