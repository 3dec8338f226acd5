use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::catalog::DatasetConfig;
use crate::error::OrcestraError;
use crate::query::similar_names;

/// Global timeout for catalog fetches and payload downloads.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// One catalog entry, as served by the ORCESTRA index.
///
/// Only `name` is guaranteed. The remaining fields answer metadata queries
/// (size, modification time, download locator) without a network round
/// trip when the index provides them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRecord {
    pub name: String,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub download_link: Option<String>,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl DatasetRecord {
    /// A record carrying nothing but its name.
    pub fn named(name: impl Into<String>) -> Self {
        DatasetRecord {
            name: name.into(),
            doi: None,
            download_link: None,
            date_created: None,
            file_size: None,
        }
    }
}

/// Owns one datatype's name-to-record catalog, backed by the remote index
/// and a local cache file.
///
/// `records` is `None` until [`DatasetManager::hydrate`] succeeds; after
/// that the map is never mutated again for the life of the manager, and the
/// cache file on disk matches it.
#[derive(Debug)]
pub struct DatasetManager {
    config: DatasetConfig,
    records: Option<BTreeMap<String, DatasetRecord>>,
}

impl DatasetManager {
    pub fn new(config: DatasetConfig) -> Self {
        DatasetManager {
            config,
            records: None,
        }
    }

    /// Build an already-hydrated manager from in-memory records.
    ///
    /// For isolated registries in tests and embedders that source their
    /// catalog elsewhere; no cache file is read or written.
    pub fn from_records(
        config: DatasetConfig,
        records: impl IntoIterator<Item = DatasetRecord>,
    ) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();
        DatasetManager {
            config,
            records: Some(records),
        }
    }

    pub fn datatype(&self) -> &str {
        &self.config.datatype
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn is_hydrated(&self) -> bool {
        self.records.is_some()
    }

    /// Populate the in-memory catalog.
    ///
    /// With `force` unset, a readable cache file satisfies hydration without
    /// any network I/O, and re-hydrating an already-hydrated manager is a
    /// no-op. Otherwise the remote catalog is fetched and the cache file is
    /// atomically replaced. A missing or corrupt cache file is treated as
    /// "not hydrated", never as a fatal condition.
    pub fn hydrate(&mut self, force: bool) -> Result<(), OrcestraError> {
        if self.records.is_some() && !force {
            return Ok(());
        }
        if !force {
            if let Some(records) = self.load_cache() {
                debug!(
                    "loaded {} '{}' records from {}",
                    records.len(),
                    self.config.datatype,
                    self.config.cache_path.display()
                );
                self.records = Some(records);
                return Ok(());
            }
        }
        let records = self.fetch_remote()?;
        self.write_cache(&records)?;
        info!(
            "fetched {} '{}' records from {}",
            records.len(),
            self.config.datatype,
            self.config.catalog_url
        );
        self.records = Some(records);
        Ok(())
    }

    /// Sorted names of every hydrated record.
    pub fn names(&self) -> Result<Vec<&str>, OrcestraError> {
        Ok(self.hydrated_records()?.keys().map(String::as_str).collect())
    }

    /// Look up one record by dataset name.
    pub fn get(&self, name: &str) -> Result<&DatasetRecord, OrcestraError> {
        let records = self.hydrated_records()?;
        records
            .get(name)
            .ok_or_else(|| OrcestraError::UnknownDataset {
                datatype: self.config.datatype.clone(),
                name: name.to_string(),
                suggestions: similar_names(name, records.keys().map(String::as_str)),
            })
    }

    fn hydrated_records(&self) -> Result<&BTreeMap<String, DatasetRecord>, OrcestraError> {
        self.records.as_ref().ok_or_else(|| OrcestraError::NotHydrated {
            datatype: self.config.datatype.clone(),
        })
    }

    /// Read the cache file; `None` when it is missing or unparseable.
    fn load_cache(&self) -> Option<BTreeMap<String, DatasetRecord>> {
        let file = File::open(&self.config.cache_path).ok()?;
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(records) => Some(records),
            Err(source) => {
                warn!(
                    "cache file {} is unreadable ({}); refetching",
                    self.config.cache_path.display(),
                    source
                );
                None
            }
        }
    }

    fn fetch_remote(&self) -> Result<BTreeMap<String, DatasetRecord>, OrcestraError> {
        let agent = http_agent();
        let mut response = agent.get(&self.config.catalog_url).call().map_err(|source| {
            OrcestraError::CatalogUnavailable {
                datatype: self.config.datatype.clone(),
                message: source.to_string(),
            }
        })?;
        let listing: Vec<DatasetRecord> = response.body_mut().read_json().map_err(|source| {
            OrcestraError::CatalogUnavailable {
                datatype: self.config.datatype.clone(),
                message: format!("unparseable catalog listing: {source}"),
            }
        })?;
        Ok(listing
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect())
    }

    /// Replace the cache file with write-then-rename semantics; a failed
    /// write never leaves a partial file at the cache path.
    fn write_cache(&self, records: &BTreeMap<String, DatasetRecord>) -> Result<(), OrcestraError> {
        let dir = self
            .config
            .cache_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(tmp.as_file(), records).map_err(|source| {
            OrcestraError::CacheWrite {
                path: self.config.cache_path.clone(),
                source,
            }
        })?;
        tmp.persist(&self.config.cache_path)
            .map_err(|source| OrcestraError::Io(source.error))?;
        Ok(())
    }
}

/// One blocking agent per operation; retries and backoff belong to the
/// caller, so no connection state is kept across calls.
pub(crate) fn http_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(HTTP_TIMEOUT))
        .build();
    config.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DatasetKind;
    use chrono::TimeZone;

    /// Config pointing at an address nothing listens on, so any network
    /// attempt fails instead of hanging.
    fn offline_config(cache_dir: &Path) -> DatasetConfig {
        let mut config = DatasetConfig::for_kind(DatasetKind::Pharmacoset, cache_dir);
        config.catalog_url = "http://127.0.0.1:9/unreachable".to_string();
        config
    }

    fn sample_records() -> Vec<DatasetRecord> {
        vec![
            DatasetRecord {
                name: "CCLE_2015".to_string(),
                doi: Some("10.5281/zenodo.0000001".to_string()),
                download_link: Some("https://example.org/CCLE_2015.rds".to_string()),
                date_created: Some(Utc.with_ymd_and_hms(2021, 6, 2, 18, 42, 27).unwrap()),
                file_size: Some(1_048_576),
            },
            DatasetRecord::named("GDSC_2020"),
        ]
    }

    fn seed_cache(config: &DatasetConfig, records: &[DatasetRecord]) {
        let map: BTreeMap<String, DatasetRecord> = records
            .iter()
            .cloned()
            .map(|record| (record.name.clone(), record))
            .collect();
        std::fs::create_dir_all(config.cache_path.parent().unwrap()).unwrap();
        let file = File::create(&config.cache_path).unwrap();
        serde_json::to_writer(file, &map).unwrap();
    }

    #[test]
    fn names_and_get_fail_before_hydration() {
        let dir = tempfile::tempdir().unwrap();
        let manager = DatasetManager::new(offline_config(dir.path()));
        assert!(matches!(
            manager.names(),
            Err(OrcestraError::NotHydrated { .. })
        ));
        assert!(matches!(
            manager.get("CCLE_2015"),
            Err(OrcestraError::NotHydrated { .. })
        ));
    }

    #[test]
    fn hydrate_loads_from_cache_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        seed_cache(&config, &sample_records());

        // The catalog URL is unreachable, so success proves the cache path.
        let mut manager = DatasetManager::new(config);
        manager.hydrate(false).expect("hydrate from cache");
        assert_eq!(manager.names().unwrap(), vec!["CCLE_2015", "GDSC_2020"]);
    }

    #[test]
    fn hydrate_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        seed_cache(&config, &sample_records());

        let mut manager = DatasetManager::new(config);
        manager.hydrate(false).expect("first hydrate");
        let first: Vec<String> = manager
            .names()
            .unwrap()
            .iter()
            .map(|n| n.to_string())
            .collect();
        manager.hydrate(false).expect("second hydrate");
        let second: Vec<String> = manager
            .names()
            .unwrap()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn forced_hydration_fails_when_remote_is_down() {
        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        seed_cache(&config, &sample_records());

        let mut manager = DatasetManager::new(config);
        let err = manager.hydrate(true).expect_err("forced fetch must fail");
        assert!(matches!(err, OrcestraError::CatalogUnavailable { .. }));
        // No partial cache write: the seeded file is still intact.
        assert!(manager.load_cache().is_some());
    }

    #[test]
    fn corrupt_cache_falls_through_to_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        std::fs::write(&config.cache_path, b"not json").unwrap();

        let mut manager = DatasetManager::new(config);
        let err = manager.hydrate(false).expect_err("fetch must fail offline");
        assert!(matches!(err, OrcestraError::CatalogUnavailable { .. }));
    }

    #[test]
    fn get_reports_suggestions_for_near_misses() {
        let dir = tempfile::tempdir().unwrap();
        let manager =
            DatasetManager::from_records(offline_config(dir.path()), sample_records());

        let record = manager.get("CCLE_2015").expect("known record");
        assert_eq!(record.file_size, Some(1_048_576));

        match manager.get("CCLE_2016") {
            Err(OrcestraError::UnknownDataset { suggestions, .. }) => {
                assert_eq!(suggestions, vec!["CCLE_2015".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn cache_round_trips_record_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let config = offline_config(dir.path());
        let records: BTreeMap<String, DatasetRecord> = sample_records()
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();

        let manager = DatasetManager::new(config.clone());
        manager.write_cache(&records).expect("write cache");
        let reloaded = manager.load_cache().expect("reload cache");
        assert_eq!(reloaded, records);
    }

    #[test]
    fn wire_listing_tolerates_extra_fields() {
        let listing: Vec<DatasetRecord> = serde_json::from_str(
            r#"[{
                "name": "CCLE_2015",
                "doi": "10.1/abc",
                "downloadLink": "https://example.org/d",
                "dateCreated": "2021-06-02T18:42:27.000Z",
                "availableDatatypes": ["rnaseq"]
            }]"#,
        )
        .expect("parse listing");
        assert_eq!(listing[0].name, "CCLE_2015");
        assert!(listing[0].date_created.is_some());
        assert_eq!(listing[0].file_size, None);
    }
}
