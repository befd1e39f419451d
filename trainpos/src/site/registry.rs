//! File-backed site registry.
//!
//! The registry keeps every [`SiteInfo`] in a single JSON object keyed by
//! site id. There is no in-memory cache: each call reads the file, and each
//! registration rewrites the whole map. A registration is therefore visible
//! to the next lookup immediately, at the cost of one file round-trip per
//! call.
//!
//! # File Format
//!
//! ```text
//! {"site1":{"id":"site1","zero":{"lat":49.44,"lng":11.07},"area":[...]}}
//! ```
//!
//! Keys are written in sorted order. Updates go to a sibling `.tmp` file
//! which is then renamed over the state file, so a failed write leaves the
//! previous map in place and readers never observe a partial file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::TempPath;
use tracing::{debug, info};

use super::error::{RegistryError, RegistryResult};
use super::types::SiteInfo;
use crate::coord::Coordinate;

/// Contents written to a fresh state file.
const EMPTY_SITE_MAP: &[u8] = b"{}";

/// Prefix for state files allocated in the system temp directory.
const TEMP_FILE_PREFIX: &str = "siteStateFile-";

/// The persisted map, ordered by site id.
pub type SiteMap = BTreeMap<String, SiteInfo>;

/// Registry of sites and their zero points, persisted to one JSON file.
///
/// Writes are serialized internally; lookups take no lock and may run
/// concurrently with a registration.
#[derive(Debug)]
pub struct SiteRegistry {
    /// Location of the state file.
    path: PathBuf,

    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,

    /// Removes the state file on drop when it was allocated as a temp file.
    _temp: Option<TempPath>,
}

impl SiteRegistry {
    /// Open a persistent registry at `path`.
    ///
    /// Missing parent directories are created. A missing or empty file is
    /// initialized with an empty map. Existing content is not validated
    /// until the first lookup or registration.
    pub fn open(path: impl Into<PathBuf>) -> RegistryResult<Self> {
        let path = path.into();

        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| RegistryError::storage(parent, e))?;
            }
            fs::write(&path, EMPTY_SITE_MAP).map_err(|e| RegistryError::storage(&path, e))?;
            info!(path = %path.display(), "Created site state file");
        } else {
            let content = fs::read(&path).map_err(|e| RegistryError::storage(&path, e))?;
            if content.iter().all(u8::is_ascii_whitespace) {
                fs::write(&path, EMPTY_SITE_MAP).map_err(|e| RegistryError::storage(&path, e))?;
                info!(path = %path.display(), "Initialized empty site state file");
            }
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
            _temp: None,
        })
    }

    /// Create a registry backed by a fresh file in the system temp directory.
    ///
    /// The file is deleted when the registry is dropped, so registrations do
    /// not survive a restart.
    pub fn temporary() -> RegistryResult<Self> {
        let temp_dir = std::env::temp_dir();
        let file = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(".json")
            .tempfile()
            .map_err(|e| RegistryError::storage(&temp_dir, e))?;

        let temp_path = file.into_temp_path();
        fs::write(&temp_path, EMPTY_SITE_MAP)
            .map_err(|e| RegistryError::storage(temp_path.to_path_buf(), e))?;

        info!(path = %temp_path.display(), "Using temporary site state file");

        Ok(Self {
            path: temp_path.to_path_buf(),
            write_lock: Mutex::new(()),
            _temp: Some(temp_path),
        })
    }

    /// Open the configured state file, or a temporary one if none is set.
    pub fn from_state_file(state_file: Option<&Path>) -> RegistryResult<Self> {
        match state_file {
            Some(path) => Self::open(path),
            None => Self::temporary(),
        }
    }

    /// Path of the backing state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace a site, then persist the full map.
    ///
    /// Registering an identical record twice leaves the file unchanged.
    pub fn register(&self, info: SiteInfo) -> RegistryResult<()> {
        info.validate()
            .map_err(|source| RegistryError::InvalidSite {
                site_id: info.site_id.clone(),
                source,
            })?;

        let _guard = self.write_lock.lock();

        let mut sites = self.load()?;
        let site_id = info.site_id.clone();
        let replaced = sites.insert(site_id.clone(), info).is_some();
        self.store(&sites)?;

        info!(
            site_id = %site_id,
            replaced,
            total_sites = sites.len(),
            "Registered site"
        );
        Ok(())
    }

    /// Look up the zero point of a registered site.
    pub fn zero_point(&self, site_id: &str) -> RegistryResult<Coordinate> {
        self.load()?
            .get(site_id)
            .map(|site| site.zero)
            .ok_or_else(|| RegistryError::NotFound(site_id.to_string()))
    }

    /// Read the full site map.
    pub fn sites(&self) -> RegistryResult<SiteMap> {
        self.load()
    }

    fn load(&self) -> RegistryResult<SiteMap> {
        let content = fs::read(&self.path).map_err(|e| RegistryError::storage(&self.path, e))?;
        serde_json::from_slice(&content).map_err(|source| RegistryError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn store(&self, sites: &SiteMap) -> RegistryResult<()> {
        let content = serde_json::to_vec(sites).map_err(RegistryError::Encode)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        if let Err(e) = fs::write(&temp_path, &content) {
            let _ = fs::remove_file(&temp_path);
            return Err(RegistryError::storage(&temp_path, e));
        }
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(RegistryError::storage(&self.path, e));
        }

        debug!(path = %self.path.display(), bytes = content.len(), "Persisted site map");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REGISTERED_SITE: &str = r#"{"site1":{"id":"site1","zero":{"lat":49.44452758496568,"lng":11.079950588826692},"area":[{"lat":49.44452758496568,"lng":11.079950588826692},{"lat":49.44564326546803,"lng":11.079950588826692},{"lat":49.44564326546803,"lng":11.083815851373487},{"lat":49.44452758496568,"lng":11.083815851373487}]}}"#;

    fn site1() -> SiteInfo {
        SiteInfo::new("site1", Coordinate::new(49.44452758496568, 11.079950588826692)).with_area(
            vec![
                Coordinate::new(49.44452758496568, 11.079950588826692),
                Coordinate::new(49.44564326546803, 11.079950588826692),
                Coordinate::new(49.44564326546803, 11.083815851373487),
                Coordinate::new(49.44452758496568, 11.083815851373487),
            ],
        )
    }

    fn site2() -> SiteInfo {
        SiteInfo::new("site2", Coordinate::new(49.55552758496568, 11.079950588826692)).with_area(
            vec![
                Coordinate::new(49.55552758496568, 11.079950588826692),
                Coordinate::new(49.55664326546803, 11.079950588826692),
                Coordinate::new(49.55664326546803, 11.083815851373487),
                Coordinate::new(49.55552758496568, 11.083815851373487),
            ],
        )
    }

    /// Registry over a state file pre-populated with `content`.
    fn prepared(content: &str) -> (TempDir, SiteRegistry) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sites.json");
        fs::write(&path, content).unwrap();
        let registry = SiteRegistry::open(&path).unwrap();
        (dir, registry)
    }

    #[test]
    fn test_register_into_temporary_registry() {
        let registry = SiteRegistry::temporary().unwrap();
        registry.register(site1()).unwrap();

        let content = fs::read_to_string(registry.path()).unwrap();
        assert_eq!(content, REGISTERED_SITE);
    }

    #[test]
    fn test_temporary_file_removed_on_drop() {
        let registry = SiteRegistry::temporary().unwrap();
        let path = registry.path().to_path_buf();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(TEMP_FILE_PREFIX));

        drop(registry);
        assert!(!path.exists());
    }

    #[test]
    fn test_register_updates_existing_site() {
        let (_dir, registry) = prepared(REGISTERED_SITE);

        let mut updated = site2();
        updated.site_id = "site1".to_string();
        registry.register(updated.clone()).unwrap();

        let sites = registry.sites().unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites["site1"], updated);
        assert_eq!(
            registry.zero_point("site1").unwrap(),
            Coordinate::new(49.55552758496568, 11.079950588826692)
        );
    }

    #[test]
    fn test_register_second_site_keeps_first() {
        let (_dir, registry) = prepared(REGISTERED_SITE);
        registry.register(site2()).unwrap();

        let expected = r#"{"site1":{"id":"site1","zero":{"lat":49.44452758496568,"lng":11.079950588826692},"area":[{"lat":49.44452758496568,"lng":11.079950588826692},{"lat":49.44564326546803,"lng":11.079950588826692},{"lat":49.44564326546803,"lng":11.083815851373487},{"lat":49.44452758496568,"lng":11.083815851373487}]},"site2":{"id":"site2","zero":{"lat":49.55552758496568,"lng":11.079950588826692},"area":[{"lat":49.55552758496568,"lng":11.079950588826692},{"lat":49.55664326546803,"lng":11.079950588826692},{"lat":49.55664326546803,"lng":11.083815851373487},{"lat":49.55552758496568,"lng":11.083815851373487}]}}"#;
        let content = fs::read_to_string(registry.path()).unwrap();
        assert_eq!(content, expected);
        assert_eq!(registry.sites().unwrap()["site1"], site1());
    }

    #[test]
    fn test_register_same_site_twice_is_idempotent() {
        let registry = SiteRegistry::temporary().unwrap();
        registry.register(site1()).unwrap();
        let first = fs::read(registry.path()).unwrap();

        registry.register(site1()).unwrap();
        let second = fs::read(registry.path()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_point_of_registered_site() {
        let (_dir, registry) = prepared(REGISTERED_SITE);
        assert_eq!(
            registry.zero_point("site1").unwrap(),
            Coordinate::new(49.44452758496568, 11.079950588826692)
        );
    }

    #[test]
    fn test_zero_point_unknown_site() {
        let (_dir, registry) = prepared(REGISTERED_SITE);
        let err = registry.zero_point("site9").unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(ref id) if id == "site9"));
    }

    #[test]
    fn test_open_creates_missing_file_and_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state").join("sites.json");

        let registry = SiteRegistry::open(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(registry.sites().unwrap().is_empty());
    }

    #[test]
    fn test_open_initializes_empty_file() {
        let (_dir, registry) = prepared("");
        assert_eq!(fs::read_to_string(registry.path()).unwrap(), "{}");
    }

    #[test]
    fn test_open_keeps_existing_content() {
        let (_dir, registry) = prepared(REGISTERED_SITE);
        assert_eq!(fs::read_to_string(registry.path()).unwrap(), REGISTERED_SITE);
    }

    #[test]
    fn test_persistent_registry_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sites.json");

        SiteRegistry::open(&path).unwrap().register(site1()).unwrap();

        let reopened = SiteRegistry::open(&path).unwrap();
        assert_eq!(reopened.sites().unwrap()["site1"], site1());
    }

    #[test]
    fn test_corrupt_state_file_is_decode_error_and_untouched() {
        let (_dir, registry) = prepared("not json");

        let err = registry.register(site1()).unwrap_err();
        assert!(matches!(err, RegistryError::Decode { .. }));
        assert!(matches!(
            registry.zero_point("site1").unwrap_err(),
            RegistryError::Decode { .. }
        ));
        assert_eq!(fs::read_to_string(registry.path()).unwrap(), "not json");
    }

    #[test]
    fn test_missing_state_file_is_storage_error() {
        let (dir, registry) = prepared(REGISTERED_SITE);
        fs::remove_file(dir.path().join("sites.json")).unwrap();

        let err = registry.zero_point("site1").unwrap_err();
        assert!(matches!(err, RegistryError::Storage { .. }));
    }

    #[test]
    fn test_invalid_zero_point_rejected() {
        let (_dir, registry) = prepared(REGISTERED_SITE);

        let err = registry
            .register(SiteInfo::new("bad", Coordinate::new(123.0, 0.0)))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSite { ref site_id, .. } if site_id == "bad"));
        assert_eq!(fs::read_to_string(registry.path()).unwrap(), REGISTERED_SITE);
    }

    #[test]
    fn test_site_without_area_decodes() {
        let (_dir, registry) = prepared(r#"{"s":{"id":"s","zero":{"lat":1.0,"lng":2.0}}}"#);
        let sites = registry.sites().unwrap();
        assert!(sites["s"].area.is_empty());
    }

    #[test]
    fn test_null_area_in_state_file_decodes() {
        let (_dir, registry) =
            prepared(r#"{"s":{"id":"s","zero":{"lat":49.4,"lng":11.0},"area":null}}"#);

        assert_eq!(
            registry.zero_point("s").unwrap(),
            Coordinate::new(49.4, 11.0)
        );
        registry.register(site1()).unwrap();
        assert!(registry.sites().unwrap()["s"].area.is_empty());
    }

    #[test]
    fn test_failed_write_is_storage_error_and_untouched() {
        let (dir, registry) = prepared(REGISTERED_SITE);
        // A directory in place of the sibling temp file makes the write fail.
        fs::create_dir(dir.path().join("sites.tmp")).unwrap();

        let err = registry.register(site2()).unwrap_err();
        assert!(matches!(err, RegistryError::Storage { .. }));
        assert_eq!(fs::read_to_string(registry.path()).unwrap(), REGISTERED_SITE);
        assert_eq!(registry.sites().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_registrations_all_persisted() {
        let registry = std::sync::Arc::new(SiteRegistry::temporary().unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = std::sync::Arc::clone(&registry);
                std::thread::spawn(move || {
                    let site = SiteInfo::new(format!("site{}", i), Coordinate::new(49.0, 11.0));
                    registry.register(site).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.sites().unwrap().len(), 8);
    }
}
