use regex::Regex;

use crate::config::UnprotectedPaths;
use crate::error::Error;
use crate::error::Result;

/// Decides whether a request path needs authentication.
///
/// A path is exempt when any unprotected pattern matches any part of it.
/// Patterns are searched, not anchored, so `/public/` exempts every path
/// containing that fragment; anchor with `^` to restrict to prefixes.
#[derive(Debug, Clone)]
pub struct PathAuthPolicy {
    patterns: Vec<Regex>,
}

impl PathAuthPolicy {
    /// Compile the unprotected path patterns.
    ///
    /// # Errors
    /// Returns `Error::InvalidPathPattern` for the first pattern that is not a
    /// valid regular expression
    pub fn new(paths: &UnprotectedPaths) -> Result<Self> {
        let patterns = paths
            .patterns()
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| Error::InvalidPathPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    pub fn is_authentication_required(&self, path: &str) -> bool {
        match self.patterns.iter().find(|pattern| pattern.is_match(path)) {
            Some(pattern) => {
                tracing::debug!(path, pattern = pattern.as_str(), "unprotected path matched");
                false
            }
            None => true,
        }
    }
}
