//! Query parsing and validation for `orcestra://` dataset references.
//!
//! A query addresses one dataset as `orcestra://<datatype>/<dataset_name>`.
//! The dataset segment may carry brace-delimited wildcard placeholders
//! (e.g. `{sample}`); those are accepted as syntactically valid and left to
//! the host runner's expansion pass, which re-validates each concretized
//! candidate.

mod report;

pub use report::QueryValidation;

use url::Url;

use crate::catalog::UnifiedDataManager;
use crate::error::OrcestraError;

/// URI scheme this provider answers to.
pub const SCHEME: &str = "orcestra";

/// Maximum number of did-you-mean suggestions.
pub const SUGGESTION_LIMIT: usize = 3;

/// Minimum similarity ratio for a name to qualify as a suggestion.
pub const SIMILARITY_CUTOFF: f64 = 0.5;

/// Parsed form of one storage query. Transient: constructed per validation
/// or resolution call, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    raw: String,
    datatype: String,
    dataset: Option<String>,
}

impl Query {
    /// Parse `raw`, checking URI well-formedness and the scheme.
    ///
    /// Datatype and dataset membership are validation concerns (see
    /// [`validate_query`]); parsing only rejects strings that are not
    /// `orcestra://...` URIs at all.
    pub fn parse(raw: &str) -> Result<Self, OrcestraError> {
        let url = Url::parse(raw).map_err(|source| OrcestraError::MalformedQuery {
            query: raw.to_string(),
            reason: source.to_string(),
        })?;
        if url.scheme() != SCHEME {
            return Err(OrcestraError::InvalidScheme {
                query: raw.to_string(),
                scheme: url.scheme().to_string(),
            });
        }
        let datatype = url.host_str().unwrap_or_default().to_string();
        // The path comes from the raw string, not the parsed URL: wildcard
        // braces are not valid URI path characters and would come back
        // percent-encoded.
        let dataset = raw
            .split_once("://")
            .and_then(|(_, rest)| rest.split_once('/'))
            .map(|(_, path)| path)
            .filter(|path| !path.is_empty() && !path.contains('/'))
            .map(str::to_string);
        Ok(Query {
            raw: raw.to_string(),
            datatype,
            dataset,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn datatype(&self) -> &str {
        &self.datatype
    }

    /// The dataset-name segment.
    ///
    /// Fails unless the path decomposes into exactly one non-empty
    /// component after the leading separator.
    pub fn dataset(&self) -> Result<&str, OrcestraError> {
        self.dataset
            .as_deref()
            .ok_or_else(|| OrcestraError::InvalidPath {
                query: self.raw.clone(),
            })
    }

    /// Whether the dataset segment still carries wildcard placeholders.
    pub fn has_wildcard(&self) -> bool {
        self.dataset
            .as_deref()
            .is_some_and(|dataset| dataset.contains('{'))
    }

    /// Literal prefix of the dataset segment before the first wildcard.
    pub fn constant_prefix(&self) -> Result<&str, OrcestraError> {
        let dataset = self.dataset()?;
        Ok(match dataset.find('{') {
            Some(at) => &dataset[..at],
            None => dataset,
        })
    }

    /// Relative `<datatype>/<dataset>` path for the host's artifact layout.
    pub fn local_suffix(&self) -> Result<String, OrcestraError> {
        Ok(format!("{}/{}", self.datatype, self.dataset()?))
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Render a concrete query string for `name` under `datatype`.
pub fn render_query(datatype: &str, name: &str) -> String {
    format!("{SCHEME}://{datatype}/{name}")
}

/// Decide whether `query` is resolvable against the hydrated catalogs.
///
/// Invalidity is a normal, reportable outcome: the verdict carries an
/// explanation meant to be shown verbatim to the pipeline author, and this
/// function never fails for control flow.
pub fn validate_query(query: &str, provider: &UnifiedDataManager) -> QueryValidation {
    match check_query(query, provider) {
        Ok(()) => QueryValidation::valid(query),
        Err(error) => QueryValidation::invalid(query, error.to_string()),
    }
}

fn check_query(query: &str, provider: &UnifiedDataManager) -> Result<(), OrcestraError> {
    let parsed = Query::parse(query)?;
    let manager = provider.registry().get_manager(parsed.datatype())?;
    let dataset = parsed.dataset()?;
    if parsed.has_wildcard() {
        // Wildcards are resolved before the storage object is actually
        // used; each concretized candidate comes back through here.
        return Ok(());
    }
    manager.get(dataset)?;
    Ok(())
}

/// Rank `names` by similarity to `query`, best match first.
///
/// Only names with a similarity ratio of at least [`SIMILARITY_CUTOFF`]
/// qualify, and at most [`SUGGESTION_LIMIT`] are returned. Ties break
/// lexicographically so the ranking is stable.
pub fn similar_names<'a>(query: &str, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = names
        .into_iter()
        .map(|name| (strsim::normalized_levenshtein(query, name), name))
        .filter(|(ratio, _)| *ratio >= SIMILARITY_CUTOFF)
        .collect();
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(b.1))
    });
    scored.truncate(SUGGESTION_LIMIT);
    scored.into_iter().map(|(_, name)| name.to_string()).collect()
}
