use std::path::PathBuf;
use thiserror::Error;

/// The main error type for orcestra-storage operations.
///
/// Query-shape errors (`MalformedQuery` through `UnknownDataset`) double as
/// the explanation text of validation verdicts: validation reports them to
/// the pipeline author instead of failing. The catalog lifecycle errors are
/// startup conditions, and the per-object errors are the ones the host
/// runner wraps in its bounded-retry policy.
#[derive(Debug, Error)]
pub enum OrcestraError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("query '{query}' cannot be parsed as a URI: {reason}")]
    MalformedQuery { query: String, reason: String },

    #[error("invalid scheme '{scheme}' in query '{query}': the scheme should be 'orcestra'")]
    InvalidScheme { query: String, scheme: String },

    #[error("unknown datatype '{datatype}': should be one of {known:?}")]
    UnknownDatatype { datatype: String, known: Vec<String> },

    #[error(
        "invalid path in query '{query}': format should follow 'orcestra://<datatype>/<dataset_name>'"
    )]
    InvalidPath { query: String },

    #[error("dataset '{name}' not found in '{datatype}'; did you mean one of {suggestions:?}?")]
    UnknownDataset {
        datatype: String,
        name: String,
        suggestions: Vec<String>,
    },

    #[error("catalog for '{datatype}' is unavailable: {message}")]
    CatalogUnavailable { datatype: String, message: String },

    #[error("catalog for '{datatype}' has not been hydrated")]
    NotHydrated { datatype: String },

    #[error("datatype '{datatype}' is already registered")]
    DuplicateDatatype { datatype: String },

    #[error("record '{datatype}/{name}' carries no {field}")]
    MetadataUnavailable {
        datatype: String,
        name: String,
        field: &'static str,
    },

    #[error("failed retrieving '{query}': {message}")]
    RetrievalFailed { query: String, message: String },

    #[error("failed writing catalog cache to {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("query '{query}' failed validation")]
    ValidationFailed { query: String },
}
