//! Storage-object lifecycle for resolved dataset references.
//!
//! The host runner's storage contract is a fixed capability surface. Rather
//! than one base class with unimplementable methods, each capability is its
//! own trait and a provider implements only what it supports: ORCESTRA
//! datasets are published through the hosting platform, never uploaded from
//! a pipeline, so [`StorageObject`] implements [`StorageRead`] and
//! [`StorageGlob`] and leaves [`StorageWrite`] unclaimed.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::catalog::{http_agent, DatasetRecord, UnifiedDataManager};
use crate::error::OrcestraError;
use crate::query::{render_query, Query};

/// Read capability: existence, metadata, and content retrieval.
///
/// Every method either completes or fails once; bounded retry with backoff
/// is the caller's wrapper.
pub trait StorageRead {
    /// Whether the referenced dataset is present in the hydrated catalog.
    fn exists(&self) -> Result<bool, OrcestraError>;

    /// Modification time, from catalog metadata.
    fn mtime(&self) -> Result<DateTime<Utc>, OrcestraError>;

    /// Payload size in bytes, from catalog metadata.
    fn size(&self) -> Result<u64, OrcestraError>;

    /// Materialize the dataset payload at the local path.
    fn retrieve_object(&self) -> Result<(), OrcestraError>;
}

/// Write capability. No implementor in this crate.
pub trait StorageWrite {
    /// Upload the local payload to the storage.
    fn store_object(&self) -> Result<(), OrcestraError>;

    /// Remove the object from the storage.
    fn remove(&self) -> Result<(), OrcestraError>;
}

/// Glob capability: enumerate concrete queries for a wildcarded one.
pub trait StorageGlob {
    /// Concrete queries for every catalog name sharing the query's literal
    /// pre-wildcard prefix.
    fn list_candidate_matches(&self) -> Result<Vec<String>, OrcestraError>;
}

/// One resolved dataset reference.
///
/// The object holds no mutable state: every answer is derived from the
/// immutable-after-hydration catalog shared through the provider, and the
/// only side effect is writing payload bytes into the host-owned local path
/// on [`StorageRead::retrieve_object`]. The local path is never deleted
/// here; cleanup belongs to the host runner.
#[derive(Clone, Debug)]
pub struct StorageObject {
    query: Query,
    local_path: PathBuf,
    provider: Arc<UnifiedDataManager>,
}

impl StorageObject {
    pub fn new(
        provider: Arc<UnifiedDataManager>,
        query: Query,
        local_path: impl Into<PathBuf>,
    ) -> Self {
        StorageObject {
            query,
            local_path: local_path.into(),
            provider,
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Resolve the catalog record this query refers to.
    ///
    /// Looked up on demand rather than captured: a record that has vanished
    /// from the catalog (staleness across a forced re-hydration) surfaces
    /// as `UnknownDataset` at the point of use.
    pub fn resolve(&self) -> Result<&DatasetRecord, OrcestraError> {
        self.provider
            .dataset(self.query.datatype(), self.query.dataset()?)
    }

    fn metadata_unavailable(&self, name: &str, field: &'static str) -> OrcestraError {
        OrcestraError::MetadataUnavailable {
            datatype: self.query.datatype().to_string(),
            name: name.to_string(),
            field,
        }
    }

    fn retrieval_failed(&self, message: impl Into<String>) -> OrcestraError {
        OrcestraError::RetrievalFailed {
            query: self.query.raw().to_string(),
            message: message.into(),
        }
    }
}

impl StorageRead for StorageObject {
    fn exists(&self) -> Result<bool, OrcestraError> {
        let dataset = self.query.dataset()?;
        let manager = match self.provider.registry().get_manager(self.query.datatype()) {
            Ok(manager) => manager,
            // An unregistered datatype is an answerable "no", not an error.
            Err(OrcestraError::UnknownDatatype { .. }) => return Ok(false),
            Err(error) => return Err(error),
        };
        Ok(manager.names()?.contains(&dataset))
    }

    fn mtime(&self) -> Result<DateTime<Utc>, OrcestraError> {
        let record = self.resolve()?;
        record
            .date_created
            .ok_or_else(|| self.metadata_unavailable(&record.name, "creation date"))
    }

    fn size(&self) -> Result<u64, OrcestraError> {
        let record = self.resolve()?;
        record
            .file_size
            .ok_or_else(|| self.metadata_unavailable(&record.name, "file size"))
    }

    fn retrieve_object(&self) -> Result<(), OrcestraError> {
        let record = self.resolve()?;
        let link = record
            .download_link
            .as_deref()
            .ok_or_else(|| self.retrieval_failed("record carries no download link"))?;

        if let Some(parent) = self.local_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        debug!("retrieving {} from {}", self.query, link);
        let agent = http_agent();
        let mut response = agent
            .get(link)
            .call()
            .map_err(|source| self.retrieval_failed(source.to_string()))?;
        let mut file = File::create(&self.local_path)?;
        let written = io::copy(&mut response.body_mut().as_reader(), &mut file)
            .map_err(|source| self.retrieval_failed(source.to_string()))?;
        info!(
            "retrieved {} ({} bytes) to {}",
            self.query,
            written,
            self.local_path.display()
        );
        Ok(())
    }
}

impl StorageGlob for StorageObject {
    /// Derived from the in-memory catalog only: recomputing yields the same
    /// set until the catalog is re-hydrated.
    fn list_candidate_matches(&self) -> Result<Vec<String>, OrcestraError> {
        let manager = self.provider.registry().get_manager(self.query.datatype())?;
        let prefix = self.query.constant_prefix()?;
        Ok(manager
            .names()?
            .iter()
            .filter(|name| name.starts_with(prefix))
            .map(|name| render_query(self.query.datatype(), name))
            .collect())
    }
}
