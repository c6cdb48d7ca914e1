use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

/// Claim carrying the registered application's consumer (client) key.
pub const CONSUMER_KEY_CLAIM: &str = "consumerKey";

/// Trait for accessing standard JWT/OIDC claims
///
/// Every accessor is optional: a missing claim is a validation failure
/// reported by the mandatory-claims check, not a decoding failure.
pub trait StandardClaims {
    /// Get the issuer (iss) claim
    fn iss(&self) -> Option<&str>;

    /// Get the subject (sub) claim
    fn sub(&self) -> Option<&str>;

    /// Get the audience (aud) claim
    fn aud(&self) -> &[String];

    /// Get the expiration time (exp) claim as a Unix timestamp
    fn exp(&self) -> Option<i64>;

    /// Get the not-before (nbf) claim as a Unix timestamp, if present
    fn nbf(&self) -> Option<i64> {
        None
    }

    /// Get the JWT ID (jti) claim
    fn jti(&self) -> Option<&str>;
}

/// The decoded body of a signed token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Audiences; a single string on the wire is normalized to one entry.
    #[serde(
        default,
        deserialize_with = "deserialize_audience",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub aud: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(
        default,
        rename = "consumerKey",
        skip_serializing_if = "Option::is_none"
    )]
    pub consumer_key: Option<String>,
    /// Space-separated scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl StandardClaims for ClaimSet {
    fn iss(&self) -> Option<&str> {
        self.iss.as_deref()
    }

    fn sub(&self) -> Option<&str> {
        self.sub.as_deref()
    }

    fn aud(&self) -> &[String] {
        &self.aud
    }

    fn exp(&self) -> Option<i64> {
        self.exp
    }

    fn nbf(&self) -> Option<i64> {
        self.nbf
    }

    fn jti(&self) -> Option<&str> {
        self.jti.as_deref()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn deserialize_audience<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let audience = Option::<OneOrMany>::deserialize(deserializer)?;
    Ok(match audience {
        Some(OneOrMany::One(aud)) => vec![aud],
        Some(OneOrMany::Many(auds)) => auds,
        None => Vec::new(),
    })
}

/// Normalized claim bag handed to the mediation layer after a token passed
/// every validation stage.
///
/// Timestamps are seconds since the Unix epoch. A validated token is
/// self-contained: `remote_token` and `jwt_token` tell the caller it may skip
/// any persisted-token lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedToken {
    pub iat: Option<i64>,
    pub exp: i64,
    pub client_id: String,
    pub sub: String,
    pub scope: Option<String>,
    pub iss: String,
    pub jti: String,
    /// Name of the identity provider the token was trusted through
    pub provider: String,
    pub remote_token: bool,
    pub jwt_token: bool,
}

impl ValidatedToken {
    /// Check whether the token was granted a specific scope.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope
            .as_deref()
            .is_some_and(|s| s.split_whitespace().any(|granted| granted == scope))
    }
}
