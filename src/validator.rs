use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::dangerous;

use crate::claims::ClaimSet;
use crate::claims::ValidatedToken;
use crate::claims::CONSUMER_KEY_CLAIM;
use crate::config::ValidatorConfig;
use crate::error::Error;
use crate::error::Result;
use crate::registry::IdentityProvider;
use crate::registry::TrustRegistry;
use crate::signature::SignatureVerifier;
use crate::trust::TrustResolver;
use crate::validators::validate_audience;
use crate::validators::validate_mandatory_claims;
use crate::validators::Clock;
use crate::validators::TemporalValidator;

/// Trait for signed-token validation
#[async_trait]
pub trait ValidateToken: Send + Sync {
    /// Validate a compact signed token and extract its normalized claims
    async fn validate(&self, token: &str) -> Result<ValidatedToken>;
}

/// Validation pipeline for signed tokens from trusted identity providers.
///
/// Stages run in a fixed order and stop at the first failure:
/// parse, mandatory claims, consumer key, expiry / not-before, audience,
/// issuer trust, signature. Registry and verifier calls are bounded by the
/// configured per-call deadline.
pub struct TokenValidator {
    registry: Arc<dyn TrustRegistry>,
    resolver: TrustResolver,
    verifier: Arc<dyn SignatureVerifier>,
    temporal: TemporalValidator,
    config: ValidatorConfig,
}

impl TokenValidator {
    /// Create a new validator over the given registry and signature verifier
    pub fn new(
        config: ValidatorConfig,
        registry: Arc<dyn TrustRegistry>,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Self {
        Self {
            resolver: TrustResolver::new(Arc::clone(&registry)),
            temporal: TemporalValidator::new(config.clock_skew),
            registry,
            verifier,
            config,
        }
    }

    /// Replace the clock used for expiry and not-before checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.temporal = TemporalValidator::with_clock(self.config.clock_skew, clock);
        self
    }

    /// Parse token data without signature validation to read the claims
    fn parse_claims(&self, token: &str) -> Result<ClaimSet> {
        if token.len() > self.config.max_token_bytes {
            return Err(Error::TokenMalformed(format!(
                "token exceeds {} bytes",
                self.config.max_token_bytes
            )));
        }

        // Signature is checked last, against the provider resolved from these claims
        let token_data = dangerous::insecure_decode::<ClaimSet>(token)
            .map_err(|e| Error::TokenMalformed(e.to_string()))?;
        Ok(token_data.claims)
    }

    /// The consumer key must be present and belong to a registered application
    async fn validate_consumer_key(&self, claims: &ClaimSet) -> Result<String> {
        let client_key = claims
            .consumer_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(Error::MissingClaim {
                claim: CONSUMER_KEY_CLAIM,
            })?;

        let lookup = with_deadline(
            "client key lookup",
            self.config.call_timeout,
            self.registry.find_application_by_client_key(client_key),
        )
        .await?;

        match lookup {
            Ok(Some(application)) => {
                tracing::debug!(application = %application.name, "consumer key resolved");
                Ok(client_key.to_string())
            }
            Ok(None) => Err(unknown_client(client_key)),
            Err(err) => {
                tracing::warn!(error = %err, "client key lookup failed");
                Err(unknown_client(client_key))
            }
        }
    }

    async fn resolve_provider(&self, issuer: &str) -> Result<IdentityProvider> {
        with_deadline(
            "trust resolution",
            self.config.call_timeout,
            self.resolver.resolve(issuer, &self.config.realm),
        )
        .await?
    }

    #[tracing::instrument(skip_all, fields(realm = %self.config.realm))]
    async fn run_pipeline(&self, token: &str) -> Result<ValidatedToken> {
        let claims = self.parse_claims(token)?;
        validate_mandatory_claims(&claims)?;
        let client_id = self.validate_consumer_key(&claims).await?;
        self.temporal.validate(&claims)?;
        validate_audience(&claims)?;

        let issuer = claims.iss.as_deref().unwrap_or_default();
        let provider = self.resolve_provider(issuer).await?;
        self.verify_signature(token, &provider).await?;

        normalize(claims, client_id, provider)
    }

    async fn verify_signature(&self, token: &str, provider: &IdentityProvider) -> Result<()> {
        let valid = with_deadline(
            "signature verification",
            self.config.call_timeout,
            self.verifier.verify(token, provider),
        )
        .await??;

        if !valid {
            return Err(Error::SignatureInvalid {
                provider: provider.name.clone(),
            });
        }

        tracing::debug!("signature validated");
        Ok(())
    }
}

#[async_trait]
impl ValidateToken for TokenValidator {
    async fn validate(&self, token: &str) -> Result<ValidatedToken> {
        let result = self.run_pipeline(token).await;

        if let Err(err) = &result {
            tracing::warn!(error = %err, realm = %self.config.realm, "token rejected");
        }
        result
    }
}

/// Build the downstream claim bag; mandatory claims were checked already
fn normalize(
    claims: ClaimSet,
    client_id: String,
    provider: IdentityProvider,
) -> Result<ValidatedToken> {
    let missing = |claim| Error::MissingClaim { claim };

    Ok(ValidatedToken {
        iat: claims.iat,
        exp: claims.exp.ok_or_else(|| missing("exp"))?,
        client_id,
        sub: claims.sub.ok_or_else(|| missing("sub"))?,
        scope: claims.scope,
        iss: claims.iss.ok_or_else(|| missing("iss"))?,
        jti: claims.jti.ok_or_else(|| missing("jti"))?,
        provider: provider.name,
        remote_token: true,
        jwt_token: true,
    })
}

fn unknown_client(client_key: &str) -> Error {
    Error::UnknownClient {
        client_key: client_key.to_string(),
    }
}

async fn with_deadline<F: Future>(
    stage: &'static str,
    timeout: Duration,
    future: F,
) -> Result<F::Output> {
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| Error::Timeout { stage, timeout })
}
