//! Validation verdict type for storage queries.
//!
//! Invalid queries are reported, not raised: the verdict pairs the original
//! query with a human-readable explanation that can be shown verbatim to
//! the pipeline author.

use std::fmt;

/// The result of validating one storage query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryValidation {
    /// The original query string, untouched.
    pub query: String,

    /// Whether the query is resolvable against the hydrated catalogs.
    pub valid: bool,

    /// Why the query was rejected; empty when valid.
    pub explanation: String,
}

impl QueryValidation {
    /// Verdict for a resolvable query.
    pub fn valid(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            valid: true,
            explanation: String::new(),
        }
    }

    /// Verdict for a rejected query.
    pub fn invalid(query: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            valid: false,
            explanation: explanation.into(),
        }
    }
}

impl fmt::Display for QueryValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            write!(f, "query '{}' is valid", self.query)
        } else {
            write!(f, "query '{}' is invalid: {}", self.query, self.explanation)
        }
    }
}
