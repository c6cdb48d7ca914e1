//! Inbound header handling at the trust boundary
//!
//! [`InboundRequestGuard`] rejects requests that arrive already carrying the
//! internally asserted subject header. [`inject_bearer`] moves a validated
//! assertion into the standard bearer authorization header.

use http::header::AUTHORIZATION;
use http::HeaderMap;
use http::HeaderName;
use http::HeaderValue;

use crate::config::GuardConfig;
use crate::config::AUTH_SUBJECT_HEADER;
use crate::error::Error;
use crate::error::Result;

/// Immutable view of one inbound request
#[derive(Debug, Clone)]
pub struct RequestContext {
    path: String,
    headers: HeaderMap,
}

impl RequestContext {
    pub fn new(path: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            path: path.into(),
            headers,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Anti-spoofing check for the internal subject header
#[derive(Debug, Clone)]
pub struct InboundRequestGuard {
    subject_header: HeaderName,
}

impl Default for InboundRequestGuard {
    fn default() -> Self {
        Self {
            subject_header: HeaderName::from_static(AUTH_SUBJECT_HEADER),
        }
    }
}

impl InboundRequestGuard {
    /// # Errors
    /// Returns `Error::InvalidHeaderName` if the configured subject header is
    /// empty or not a valid header name
    pub fn new(config: &GuardConfig) -> Result<Self> {
        Ok(Self {
            subject_header: parse_header_name(&config.subject_header)?,
        })
    }

    /// Reject the request if any value of the subject header is non-blank
    pub fn validate_inbound(&self, headers: &HeaderMap) -> Result<()> {
        let spoofed = headers
            .get_all(&self.subject_header)
            .iter()
            .any(|value| !is_blank(value));

        if spoofed {
            tracing::warn!(
                header = %self.subject_header,
                "subject header found in inbound request before security validation"
            );
            return Err(Error::SpoofedIdentityHeader {
                header: self.subject_header.to_string(),
            });
        }

        Ok(())
    }
}

/// Parse a configured header name; matching is case-insensitive
pub(crate) fn parse_header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.trim().as_bytes()).map_err(|source| Error::InvalidHeaderName {
        header: name.to_string(),
        source,
    })
}

// Values that are not visible ASCII count as content.
fn is_blank(value: &HeaderValue) -> bool {
    match value.to_str() {
        Ok(text) => text.trim().is_empty(),
        Err(_) => false,
    }
}

/// Read the token from `assertion_header`.
///
/// # Errors
/// Returns `Error::MissingToken` if the header is absent, blank or not text
pub fn assertion_token<'a>(headers: &'a HeaderMap, assertion_header: &str) -> Result<&'a str> {
    headers
        .get(assertion_header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::MissingToken {
            header: assertion_header.to_string(),
        })
}

/// Produce the outbound headers: the assertion header removed and
/// `Authorization: Bearer <token>` set. The inbound map is left untouched.
pub fn inject_bearer(headers: &HeaderMap, assertion_header: &str) -> Result<HeaderMap> {
    let token = assertion_token(headers, assertion_header)?;
    let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| Error::TokenMalformed(e.to_string()))?;

    let mut outbound = headers.clone();
    outbound.remove(assertion_header);
    outbound.insert(AUTHORIZATION, bearer);
    tracing::debug!(removed = assertion_header, "bearer authorization header set");

    Ok(outbound)
}
