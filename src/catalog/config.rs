use std::path::{Path, PathBuf};

/// Base URL of the ORCESTRA dataset index.
const ORCESTRA_API: &str = "https://orcestra.ca/api";

/// Record type served by one ORCESTRA datatype endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetKind {
    Pharmacoset,
    Toxicoset,
    Xevaset,
    Radioset,
    Icbset,
    Radiomicset,
    ClinicalGenomics,
}

impl DatasetKind {
    /// Every kind ORCESTRA serves, in registry order.
    pub const ALL: [DatasetKind; 7] = [
        DatasetKind::Pharmacoset,
        DatasetKind::Toxicoset,
        DatasetKind::Xevaset,
        DatasetKind::Radioset,
        DatasetKind::Icbset,
        DatasetKind::Radiomicset,
        DatasetKind::ClinicalGenomics,
    ];

    /// Datatype name, as used in query authorities and registry keys.
    pub fn datatype(&self) -> &'static str {
        match self {
            DatasetKind::Pharmacoset => "pharmacosets",
            DatasetKind::Toxicoset => "toxicosets",
            DatasetKind::Xevaset => "xevasets",
            DatasetKind::Radioset => "radiosets",
            DatasetKind::Icbset => "icbsets",
            DatasetKind::Radiomicset => "radiomicsets",
            DatasetKind::ClinicalGenomics => "clinicalgenomics",
        }
    }

    /// Path slug of this kind's listing endpoint on the ORCESTRA API.
    fn api_slug(&self) -> &'static str {
        match self {
            DatasetKind::Pharmacoset => "psets",
            DatasetKind::Toxicoset => "toxicosets",
            DatasetKind::Xevaset => "xevasets",
            DatasetKind::Radioset => "radiosets",
            DatasetKind::Icbset => "icbsets",
            DatasetKind::Radiomicset => "radiomicsets",
            DatasetKind::ClinicalGenomics => "clinicalgenomics",
        }
    }
}

/// Static description of one datatype's catalog source: where the remote
/// listing lives, where its local cache file goes, and which record type it
/// serves. Built once at startup and immutable thereafter.
#[derive(Clone, Debug)]
pub struct DatasetConfig {
    pub datatype: String,
    pub kind: DatasetKind,
    pub catalog_url: String,
    pub cache_path: PathBuf,
}

impl DatasetConfig {
    /// Config for one datatype, with its cache file placed under `cache_dir`.
    pub fn for_kind(kind: DatasetKind, cache_dir: &Path) -> Self {
        DatasetConfig {
            datatype: kind.datatype().to_string(),
            kind,
            catalog_url: format!("{}/{}/available", ORCESTRA_API, kind.api_slug()),
            cache_path: cache_dir.join(format!("{}.json", kind.datatype())),
        }
    }

    /// The built-in table covering every datatype ORCESTRA serves.
    pub fn builtin(cache_dir: &Path) -> Vec<DatasetConfig> {
        DatasetKind::ALL
            .iter()
            .map(|kind| DatasetConfig::for_kind(*kind, cache_dir))
            .collect()
    }
}
