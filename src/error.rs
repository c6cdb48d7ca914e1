use std::fmt::Debug;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by registry and verifier backends.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("The provided token could not be parsed: {0}")]
    TokenMalformed(String),
    #[error("Mandatory claim '{claim}' is missing or empty in the provided token")]
    MissingClaim { claim: &'static str },
    #[error("Cannot find a registered application for consumer key: {client_key}")]
    UnknownClient { client_key: String },
    #[error("The provided token has expired. Expiration timestamp: {exp}, skew: {skew_secs}s")]
    TokenExpired { exp: i64, skew_secs: u64 },
    #[error("The provided token is used before its not-before time: {nbf}, skew: {skew_secs}s")]
    TokenNotYetValid { nbf: i64, skew_secs: u64 },
    #[error("No trusted identity provider registered with issuer: {issuer} in realm: {realm}")]
    UntrustedIssuer { issuer: String, realm: String },
    #[error("Error while retrieving trusted identity provider for issuer: {issuer} in realm: {realm}")]
    TrustResolution {
        issuer: String,
        realm: String,
        #[source]
        source: BoxError,
    },
    #[error("Signature of the provided token is not valid for identity provider: {provider}")]
    SignatureInvalid { provider: String },
    #[error("A subject header '{header}' is present in the inbound request before security validation")]
    SpoofedIdentityHeader { header: String },
    #[error("No token found in header '{header}'")]
    MissingToken { header: String },
    #[error("Deadline of {timeout:?} exceeded during {stage}")]
    Timeout {
        stage: &'static str,
        timeout: Duration,
    },
    #[error("Invalid unprotected path pattern '{pattern}': {source}")]
    InvalidPathPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid header name '{header}' in guard configuration: {source}")]
    InvalidHeaderName {
        header: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },
    #[error("Missing 'kid' in the header of the provided JWT")]
    KeyIdMissing,
    #[error("Key of your provided JWT does not match in JWKs")]
    KeyNotMatchInJwks,
    #[error("Only RSA or Octet keys are currently supported, got: {0:?}")]
    AlgorithmNotSupported(String),
    #[error("Identity provider '{0}' exposes no JWKS location")]
    NoJwksLocation(String),
    #[error("JWKS error: {0}")]
    Jwks(String),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Registry error: {0}")]
    Registry(#[source] BoxError),
}

impl Error {
    /// Whether the caller may retry the same token later.
    ///
    /// Only infrastructure failures qualify; every other variant is a
    /// permanent rejection of the presented token.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::TrustResolution { .. } | Error::Timeout { .. } | Error::Jwks(_)
        )
    }

    pub(crate) fn untrusted(issuer: &str, realm: &str) -> Self {
        Error::UntrustedIssuer {
            issuer: issuer.to_string(),
            realm: realm.to_string(),
        }
    }

    pub(crate) fn trust_resolution(issuer: &str, realm: &str, source: Error) -> Self {
        Error::TrustResolution {
            issuer: issuer.to_string(),
            realm: realm.to_string(),
            source: Box::new(source),
        }
    }
}

pub(crate) fn openid_jwks_error(error: reqwest::Error) -> Error {
    Error::Jwks(format!("Failed to fetch OpenID config: {error}"))
}

pub(crate) fn fetch_jwks_error(error: reqwest::Error) -> Error {
    Error::Jwks(format!("Failed to fetch JWKS: {error}"))
}
