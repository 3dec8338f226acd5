use std::collections::BTreeMap;

use log::warn;

use crate::catalog::{DatasetConfig, DatasetManager, DatasetRecord};
use crate::error::OrcestraError;

/// Name-indexed collection of [`DatasetManager`]s.
///
/// Registration is exhaustive and runs exactly once at startup, driven by
/// the static config table; entries are never removed for the life of the
/// process.
#[derive(Debug, Default)]
pub struct DatasetRegistry {
    managers: BTreeMap<String, DatasetManager>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a manager under its datatype name.
    pub fn register(&mut self, manager: DatasetManager) -> Result<(), OrcestraError> {
        let datatype = manager.datatype().to_string();
        if self.managers.contains_key(&datatype) {
            return Err(OrcestraError::DuplicateDatatype { datatype });
        }
        self.managers.insert(datatype, manager);
        Ok(())
    }

    /// Look up the manager owning `datatype`.
    pub fn get_manager(&self, datatype: &str) -> Result<&DatasetManager, OrcestraError> {
        self.managers
            .get(datatype)
            .ok_or_else(|| OrcestraError::UnknownDatatype {
                datatype: datatype.to_string(),
                known: self.names(),
            })
    }

    /// Sorted registered datatype names.
    pub fn names(&self) -> Vec<String> {
        self.managers.keys().cloned().collect()
    }

    pub fn managers(&self) -> impl Iterator<Item = &DatasetManager> {
        self.managers.values()
    }

    fn managers_mut(&mut self) -> impl Iterator<Item = &mut DatasetManager> {
        self.managers.values_mut()
    }
}

/// One datatype whose catalog could not be hydrated.
#[derive(Debug)]
pub struct HydrationFailure {
    pub datatype: String,
    pub error: OrcestraError,
}

/// Facade over a [`DatasetRegistry`]: the set of known datatype names,
/// hydration across every manager, and routing of (datatype, dataset-name)
/// pairs to the owning manager's metadata.
#[derive(Debug)]
pub struct UnifiedDataManager {
    registry: DatasetRegistry,
}

impl UnifiedDataManager {
    pub fn new(registry: DatasetRegistry) -> Self {
        UnifiedDataManager { registry }
    }

    /// Build a registry from a config table, one manager per datatype.
    ///
    /// This is the explicit initialization point: nothing is registered or
    /// hydrated as an import-time side effect, so tests can construct
    /// isolated providers from their own config tables.
    pub fn from_configs(
        configs: impl IntoIterator<Item = DatasetConfig>,
    ) -> Result<Self, OrcestraError> {
        let mut registry = DatasetRegistry::new();
        for config in configs {
            registry.register(DatasetManager::new(config))?;
        }
        Ok(UnifiedDataManager::new(registry))
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    /// Sorted names of every registered datatype.
    pub fn names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Hydrate every registered manager.
    ///
    /// Datatypes whose catalog cannot be hydrated are reported back rather
    /// than aborting the rest: a datatype without a catalog is unusable for
    /// queries against it, not a fatal startup condition. The caller decides
    /// whether any failure is fatal.
    pub fn hydrate_cache(&mut self, force: bool) -> Vec<HydrationFailure> {
        let mut failures = Vec::new();
        for manager in self.registry.managers_mut() {
            if let Err(error) = manager.hydrate(force) {
                warn!("hydration failed for '{}': {}", manager.datatype(), error);
                failures.push(HydrationFailure {
                    datatype: manager.datatype().to_string(),
                    error,
                });
            }
        }
        failures
    }

    /// Route a (datatype, dataset-name) pair to the owning manager's record.
    pub fn dataset(&self, datatype: &str, name: &str) -> Result<&DatasetRecord, OrcestraError> {
        self.registry.get_manager(datatype)?.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DatasetKind;
    use std::path::Path;

    fn config_for(kind: DatasetKind, url: &str) -> DatasetConfig {
        let mut config = DatasetConfig::for_kind(kind, Path::new("unused"));
        config.catalog_url = url.to_string();
        config
    }

    fn pharmacosets_manager() -> DatasetManager {
        DatasetManager::from_records(
            config_for(DatasetKind::Pharmacoset, "http://127.0.0.1:9/x"),
            [
                DatasetRecord::named("CCLE_2015"),
                DatasetRecord::named("GDSC_2020"),
            ],
        )
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = DatasetRegistry::new();
        registry.register(pharmacosets_manager()).expect("first");
        let err = registry
            .register(pharmacosets_manager())
            .expect_err("second registration must fail");
        assert!(matches!(err, OrcestraError::DuplicateDatatype { .. }));
    }

    #[test]
    fn unknown_datatype_lists_the_valid_set() {
        let mut registry = DatasetRegistry::new();
        registry.register(pharmacosets_manager()).unwrap();

        match registry.get_manager("toxsets") {
            Err(OrcestraError::UnknownDatatype { known, .. }) => {
                assert_eq!(known, vec!["pharmacosets".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn duplicate_config_table_fails_construction() {
        let configs = vec![
            config_for(DatasetKind::Pharmacoset, "http://127.0.0.1:9/a"),
            config_for(DatasetKind::Pharmacoset, "http://127.0.0.1:9/b"),
        ];
        assert!(matches!(
            UnifiedDataManager::from_configs(configs),
            Err(OrcestraError::DuplicateDatatype { .. })
        ));
    }

    #[test]
    fn hydration_failures_are_partial_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // One manager with a seeded cache, one pointing at nothing.
        let good_config = {
            let mut config = DatasetConfig::for_kind(DatasetKind::Pharmacoset, dir.path());
            config.catalog_url = "http://127.0.0.1:9/x".to_string();
            config
        };
        let good =
            DatasetManager::from_records(good_config, [DatasetRecord::named("CCLE_2015")]);
        let bad = DatasetManager::new(config_for(DatasetKind::Toxicoset, "http://127.0.0.1:9/y"));

        let mut registry = DatasetRegistry::new();
        registry.register(good).unwrap();
        registry.register(bad).unwrap();
        let mut unified = UnifiedDataManager::new(registry);

        let failures = unified.hydrate_cache(false);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].datatype, "toxicosets");

        // The hydrated datatype keeps answering queries.
        assert!(unified.dataset("pharmacosets", "CCLE_2015").is_ok());
        assert!(matches!(
            unified.dataset("toxicosets", "anything"),
            Err(OrcestraError::NotHydrated { .. })
        ));
    }

    #[test]
    fn dataset_routes_to_the_owning_manager() {
        let mut registry = DatasetRegistry::new();
        registry.register(pharmacosets_manager()).unwrap();
        let unified = UnifiedDataManager::new(registry);

        assert_eq!(
            unified.dataset("pharmacosets", "GDSC_2020").unwrap().name,
            "GDSC_2020"
        );
        assert!(matches!(
            unified.dataset("pharmacosets", "nope"),
            Err(OrcestraError::UnknownDataset { .. })
        ));
    }
}
