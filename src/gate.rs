use std::sync::Arc;

use http::HeaderMap;
use http::HeaderName;

use crate::claims::ValidatedToken;
use crate::config::GuardConfig;
use crate::error::Result;
use crate::guard::assertion_token;
use crate::guard::inject_bearer;
use crate::guard::parse_header_name;
use crate::guard::InboundRequestGuard;
use crate::guard::RequestContext;
use crate::policy::PathAuthPolicy;
use crate::validator::ValidateToken;

/// Outcome of gating one request
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Path is exempt from authentication; forward as is
    Unprotected,
    /// Token validated; forward with `headers` in place of the inbound ones
    Authenticated {
        token: ValidatedToken,
        headers: HeaderMap,
    },
}

/// Per-request entry point: header guard, path policy, then token validation.
pub struct RequestGate {
    guard: InboundRequestGuard,
    policy: Arc<PathAuthPolicy>,
    validator: Arc<dyn ValidateToken>,
    assertion_header: HeaderName,
}

impl RequestGate {
    /// # Errors
    /// Returns `Error::InvalidHeaderName` if either configured header name is
    /// empty or invalid
    pub fn new(
        config: &GuardConfig,
        policy: Arc<PathAuthPolicy>,
        validator: Arc<dyn ValidateToken>,
    ) -> Result<Self> {
        Ok(Self {
            guard: InboundRequestGuard::new(config)?,
            policy,
            validator,
            assertion_header: parse_header_name(&config.assertion_header)?,
        })
    }

    /// Decide what happens to `request`.
    ///
    /// # Errors
    /// Any guard or validation failure; all are terminal for this request.
    #[tracing::instrument(skip_all, fields(path = request.path()))]
    pub async fn authorize(&self, request: &RequestContext) -> Result<GateDecision> {
        self.guard.validate_inbound(request.headers())?;

        if !self.policy.is_authentication_required(request.path()) {
            return Ok(GateDecision::Unprotected);
        }

        let token = assertion_token(request.headers(), self.assertion_header.as_str())?;
        let validated = self.validator.validate(token).await?;
        let headers = inject_bearer(request.headers(), self.assertion_header.as_str())?;

        tracing::debug!(sub = %validated.sub, iss = %validated.iss, "request authenticated");
        Ok(GateDecision::Authenticated {
            token: validated,
            headers,
        })
    }
}
