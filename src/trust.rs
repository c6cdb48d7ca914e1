//! Issuer trust resolution
//!
//! Maps a token issuer within a realm to the identity provider that is
//! trusted to have signed it. Issuers without an explicit registration are
//! still trusted when they name the realm's resident provider, so the
//! system's own issuer never needs a duplicate registry entry.

use std::sync::Arc;

use crate::error::Error;
use crate::error::Result;
use crate::registry::IdentityProvider;
use crate::registry::ProviderLookup;
use crate::registry::TenantRealm;
use crate::registry::TrustRegistry;

#[derive(Clone)]
pub struct TrustResolver {
    registry: Arc<dyn TrustRegistry>,
}

impl TrustResolver {
    pub fn new(registry: Arc<dyn TrustRegistry>) -> Self {
        Self { registry }
    }

    /// Resolve the trusted provider for `issuer`.
    ///
    /// # Errors
    /// - [`Error::UntrustedIssuer`] when neither a registered provider nor the
    ///   resident provider matches the issuer
    /// - [`Error::TrustResolution`] when the registry itself fails
    #[tracing::instrument(skip(self, realm), fields(realm = %realm))]
    pub async fn resolve(&self, issuer: &str, realm: &TenantRealm) -> Result<IdentityProvider> {
        let lookup = self
            .registry
            .find_provider_by_issuer(issuer, realm)
            .await
            .map_err(|e| Error::trust_resolution(issuer, realm.as_str(), e))?;

        let provider = match lookup {
            ProviderLookup::Found(provider) => Some(provider),
            ProviderLookup::NotFound => self.resident_provider_for(issuer, realm).await?,
        };

        match provider {
            Some(provider) => {
                tracing::debug!(provider = %provider.name, "issuer resolved to trusted provider");
                Ok(provider)
            }
            None => {
                tracing::warn!("no trusted provider for issuer");
                Err(Error::untrusted(issuer, realm.as_str()))
            }
        }
    }

    /// Check whether the token was issued by the realm's own resident provider
    async fn resident_provider_for(
        &self,
        issuer: &str,
        realm: &TenantRealm,
    ) -> Result<Option<IdentityProvider>> {
        let Some(resident) = self
            .registry
            .find_resident_provider(realm)
            .await
            .map_err(|e| Error::trust_resolution(issuer, realm.as_str(), e))?
        else {
            tracing::debug!("realm has no resident provider");
            return Ok(None);
        };

        let matches = resident
            .entity_id()
            .is_some_and(|entity_id| entity_id.eq_ignore_ascii_case(issuer));

        Ok(matches.then_some(resident))
    }
}
