//! Claim-level checks run by the validation pipeline
//!
//! Each check is pure apart from reading the clock and stops at the first
//! violation it finds.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::claims::StandardClaims;
use crate::error::Error;
use crate::error::Result;

/// Source of the current time in Unix seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Fail with [`Error::MissingClaim`] unless iss, sub, exp, jti and aud are all
/// present and non-empty.
pub fn validate_mandatory_claims<C: StandardClaims>(claims: &C) -> Result<()> {
    let missing = if is_blank(claims.iss()) {
        Some("iss")
    } else if is_blank(claims.sub()) {
        Some("sub")
    } else if claims.exp().is_none() {
        Some("exp")
    } else if is_blank(claims.jti()) {
        Some("jti")
    } else if claims.aud().iter().all(|aud| aud.is_empty()) {
        Some("aud")
    } else {
        None
    };

    match missing {
        Some(claim) => Err(Error::MissingClaim { claim }),
        None => Ok(()),
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

/// Expiry and not-before checks with a shared clock skew
#[derive(Clone)]
pub struct TemporalValidator {
    skew_secs: u64,
    clock: Arc<dyn Clock>,
}

impl TemporalValidator {
    pub fn new(skew: Duration) -> Self {
        Self::with_clock(skew, Arc::new(SystemClock))
    }

    pub fn with_clock(skew: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            skew_secs: skew.as_secs(),
            clock,
        }
    }

    /// Run the expiry check, then the not-before check
    pub fn validate<C: StandardClaims>(&self, claims: &C) -> Result<()> {
        let exp = claims.exp().ok_or(Error::MissingClaim { claim: "exp" })?;
        self.validate_expiry(exp)?;

        if let Some(nbf) = claims.nbf() {
            self.validate_not_before(nbf)?;
        }

        Ok(())
    }

    /// `now + skew == exp` is still valid
    pub fn validate_expiry(&self, exp: i64) -> Result<()> {
        let now = self.clock.now();
        if self.skewed(now) > exp {
            tracing::debug!(exp, now, skew = self.skew_secs, "token is expired");
            return Err(Error::TokenExpired {
                exp,
                skew_secs: self.skew_secs,
            });
        }

        tracing::debug!("expiration time (exp) of token validated");
        Ok(())
    }

    pub fn validate_not_before(&self, nbf: i64) -> Result<()> {
        let now = self.clock.now();
        if self.skewed(now) < nbf {
            tracing::debug!(nbf, now, skew = self.skew_secs, "token used before not-before time");
            return Err(Error::TokenNotYetValid {
                nbf,
                skew_secs: self.skew_secs,
            });
        }

        tracing::debug!("not-before time (nbf) of token validated");
        Ok(())
    }

    fn skewed(&self, now: i64) -> i64 {
        let skew = i64::try_from(self.skew_secs).unwrap_or(i64::MAX);
        now.saturating_add(skew)
    }
}

/// Audience check.
///
/// Intentionally permissive: every audience is accepted. Tokens minted for
/// other services pass this stage, so downstream services must not rely on
/// it for audience isolation.
// TODO: enforce an allow-list once every mesh service sets `aud` on the tokens it mints
pub fn validate_audience<C: StandardClaims>(_claims: &C) -> Result<()> {
    Ok(())
}
