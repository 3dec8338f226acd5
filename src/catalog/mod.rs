//! Dataset catalogs for the ORCESTRA hosting platform.
//!
//! A catalog is the name-to-metadata mapping for one datatype, sourced from
//! the remote ORCESTRA index and cached on disk. [`DatasetManager`] owns one
//! catalog and its hydration, [`DatasetRegistry`] collects the managers by
//! datatype name, and [`UnifiedDataManager`] is the facade the rest of the
//! crate queries.
//!
//! Hydration happens once, eagerly, when the provider is constructed. After
//! that the catalogs are treated as immutable and every lookup is a pure
//! in-memory read.

mod config;
mod manager;
mod registry;

pub use config::{DatasetConfig, DatasetKind};
pub use manager::{DatasetManager, DatasetRecord};
pub use registry::{DatasetRegistry, HydrationFailure, UnifiedDataManager};

pub(crate) use manager::http_agent;
