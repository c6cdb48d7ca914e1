//! Signature verification seam
//!
//! The validation pipeline never touches key material. It hands the raw
//! token and the resolved provider to a [`SignatureVerifier`] and uses the
//! boolean answer as the final authenticity gate.
//!
//! [`JwksSignatureVerifier`] verifies against the provider's published JSON
//! Web Key Set: the OIDC authenticator's `jwksUri` property when configured,
//! otherwise the set named by the provider's OpenID configuration.

use std::collections::HashSet;

use async_trait::async_trait;
use jsonwebtoken::decode;
use jsonwebtoken::decode_header;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::AlgorithmParameters;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::jwk::KeyAlgorithm;
use jsonwebtoken::jwk::RSAKeyParameters;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::Validation;

use crate::claims::ClaimSet;
use crate::config::JwksVerifierConfig;
use crate::error::Error;
use crate::error::Result;
use crate::jwks_cache::JwksCache;
use crate::jwks_cache::JwksSource;
use crate::registry::IdentityProvider;
use crate::registry::JWKS_URI;

/// Trait for cryptographic signature verification
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    /// Confirm that `token` was signed by `provider`.
    ///
    /// `Ok(false)` means the signature does not verify; `Err` means the
    /// check itself could not be carried out.
    async fn verify(&self, token: &str, provider: &IdentityProvider) -> Result<bool>;
}

/// Signature verifier backed by per-provider JWKS with caching
pub struct JwksSignatureVerifier {
    jwks_cache: JwksCache,
}

impl JwksSignatureVerifier {
    pub fn new(config: JwksVerifierConfig) -> Self {
        let client = config.http_client.unwrap_or_default();

        Self {
            jwks_cache: JwksCache::new(config.jwks_cache_ttl, config.min_reload_interval, client),
        }
    }

    fn jwks_source(provider: &IdentityProvider) -> Result<JwksSource> {
        if let Some(uri) = provider.oidc_property(JWKS_URI) {
            return Ok(JwksSource::Uri(uri.to_string()));
        }

        provider
            .entity_id()
            .map(|issuer| JwksSource::Discovery(issuer.to_string()))
            .ok_or_else(|| Error::NoJwksLocation(provider.name.clone()))
    }

    /// Find the key for `kid`, reloading the cached set once on a miss so
    /// that rotated keys are picked up. Reloads are rate limited per source.
    async fn decoding_key(
        &self,
        source: &JwksSource,
        kid: &str,
        alg: Algorithm,
    ) -> Result<Option<DecodingKey>> {
        let jwks = self.jwks_cache.key_set(source).await?;
        match get_decoding_key_for_kid(kid, alg, &jwks) {
            Err(Error::KeyNotMatchInJwks) => {
                tracing::debug!(kid, "kid not in cached JWKS, reloading");
                let jwks = self.jwks_cache.reload_after_miss(source).await?;
                get_decoding_key_for_kid(kid, alg, &jwks)
            }
            other => other,
        }
    }
}

#[async_trait]
impl SignatureVerifier for JwksSignatureVerifier {
    async fn verify(&self, token: &str, provider: &IdentityProvider) -> Result<bool> {
        let header = decode_header(token)?;
        let kid = header.kid.ok_or(Error::KeyIdMissing)?;

        let source = Self::jwks_source(provider)?;
        let Some(decoding_key) = self.decoding_key(&source, &kid, header.alg).await? else {
            tracing::warn!(
                provider = %provider.name,
                kid = %kid,
                alg = ?header.alg,
                "key cannot verify the token's algorithm"
            );
            return Ok(false);
        };

        match decode::<ClaimSet>(token, &decoding_key, &signature_only_validation(header.alg)) {
            Ok(_) => Ok(true),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm
                ) =>
            {
                tracing::warn!(
                    provider = %provider.name,
                    kid = %kid,
                    error = %err,
                    "signature mismatch"
                );
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Validation that checks only the signature; claim checks already ran in
/// the pipeline with the configured clock skew.
fn signature_only_validation(alg: Algorithm) -> Validation {
    let mut validation = Validation::new(alg);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();
    validation
}

/// Get the decoding key for the given key ID from the JWKS.
///
/// `Ok(None)` when the key cannot verify `alg`: it declares another `alg`, or
/// belongs to another key family.
fn get_decoding_key_for_kid(
    kid: &str,
    alg: Algorithm,
    jwks: &JwkSet,
) -> Result<Option<DecodingKey>> {
    let jwk = jwks.find(kid).ok_or(Error::KeyNotMatchInJwks)?;

    if let Some(declared) = &jwk.common.key_algorithm {
        if !algorithm_matches(declared, alg) {
            return Ok(None);
        }
    }

    let key = match &jwk.algorithm {
        AlgorithmParameters::RSA(RSAKeyParameters { n, e, .. }) => {
            DecodingKey::from_rsa_components(n, e)?
        }
        AlgorithmParameters::OctetKey(params) => DecodingKey::from_secret(params.value.as_bytes()),
        other_algo => return Err(Error::AlgorithmNotSupported(format!("{other_algo:?}"))),
    };

    Ok((key.family() == alg.family()).then_some(key))
}

// Both enums name the JWS algorithms identically (RS256, HS256, ...)
fn algorithm_matches(declared: &KeyAlgorithm, alg: Algorithm) -> bool {
    format!("{declared:?}") == format!("{alg:?}")
}
