//! # Tokengate
//!
//! Signed-token trust and validation for the edge of a service mesh.
//!
//! For every inbound request the [`RequestGate`] decides whether
//! authentication is needed and, if so, whether the presented token was
//! issued by an identity provider the realm trusts.
//!
//! ## Features
//!
//! - Anti-spoofing guard for the internally asserted subject header
//! - Regex-based exemption of unprotected paths
//! - Mandatory-claim, consumer-key and skew-aware expiry / not-before checks
//! - Issuer trust resolution with fallback to the realm's resident provider
//! - Pluggable registry and signature verification, with a JWKS-backed
//!   verifier and an in-memory registry included
//! - Per-call deadlines on registry and verifier calls
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use http::HeaderMap;
//! use tokengate::{
//!     GateDecision, GuardConfig, InMemoryTrustRegistry, JwksSignatureVerifier,
//!     JwksVerifierConfig, PathAuthPolicy, RequestContext, RequestGate, TokenValidator,
//!     UnprotectedPaths, ValidatorConfig,
//! };
//!
//! # async fn example(headers: HeaderMap) -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(InMemoryTrustRegistry::new());
//! let verifier = Arc::new(JwksSignatureVerifier::new(JwksVerifierConfig::new()));
//! let validator = TokenValidator::new(ValidatorConfig::default(), registry, verifier);
//!
//! let policy = PathAuthPolicy::new(&UnprotectedPaths::new(["^/health", "/public/.*"]))?;
//! let gate = RequestGate::new(&GuardConfig::default(), Arc::new(policy), Arc::new(validator))?;
//!
//! match gate.authorize(&RequestContext::new("/orders/42", headers)).await? {
//!     GateDecision::Unprotected => println!("forwarding unauthenticated"),
//!     GateDecision::Authenticated { token, .. } => println!("caller: {}", token.sub),
//! }
//! # Ok(())
//! # }
//! ```

mod claims;
mod config;
mod error;
mod gate;
mod guard;
mod jwks_cache;
mod policy;
mod registry;
mod signature;
mod trust;
mod validator;
mod validators;

// Re-exports for public API
pub use claims::ClaimSet;
pub use claims::StandardClaims;
pub use claims::ValidatedToken;
pub use claims::CONSUMER_KEY_CLAIM;
pub use config::GuardConfig;
pub use config::JwksVerifierConfig;
pub use config::UnprotectedPaths;
pub use config::ValidatorConfig;
pub use config::AUTH_SUBJECT_HEADER;
pub use config::DEFAULT_MAX_TOKEN_BYTES;
pub use config::JWT_ASSERTION_HEADER;
pub use error::BoxError;
pub use error::Error;
pub use error::Result;
pub use gate::GateDecision;
pub use gate::RequestGate;
pub use guard::assertion_token;
pub use guard::inject_bearer;
pub use guard::InboundRequestGuard;
pub use guard::RequestContext;
pub use policy::PathAuthPolicy;
pub use registry::Application;
pub use registry::FederatedAuthenticatorConfig;
pub use registry::IdentityProvider;
pub use registry::InMemoryTrustRegistry;
pub use registry::ProviderLookup;
pub use registry::TenantRealm;
pub use registry::TrustRegistry;
pub use registry::DEFAULT_REALM;
pub use registry::IDP_ENTITY_ID;
pub use registry::JWKS_URI;
pub use registry::OIDC_AUTHENTICATOR;
pub use signature::JwksSignatureVerifier;
pub use signature::SignatureVerifier;
pub use trust::TrustResolver;
pub use validator::TokenValidator;
pub use validator::ValidateToken;
pub use validators::validate_audience;
pub use validators::validate_mandatory_claims;
pub use validators::Clock;
pub use validators::FixedClock;
pub use validators::SystemClock;
pub use validators::TemporalValidator;
