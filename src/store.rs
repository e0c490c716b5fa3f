// THEORY:
// The metrics history is an ordered, append-only list of `MetricsRecord`s with
// array semantics: no keys, only positions. Its one quirk is that every write
// rewrites the whole collection. An append reads everything, pushes one record
// and writes everything back, and a removal does the same with one element
// spliced out.
//
// `JsonFileStore` keeps the list as a JSON array in a single file. A missing or
// empty file is an empty history. Unparsable content also reads as empty for
// display, but writes refuse to run over it: rewriting the collection would drop
// every record that could not be read. Writes go to a temporary file in the same
// directory which is then renamed over the history, so an interrupted write
// leaves the previous content intact. `MemoryStore` is the same contract without
// a file, for tests and one-shot runs.

use crate::core_modules::error::StoreError;
use crate::record::MetricsRecord;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

pub const DEFAULT_STORE_FILE: &str = "imageMetricsData.json";

/// The persistence collaborator for finished comparisons.
pub trait MetricsStore: Send {
    fn load_all(&self) -> Result<Vec<MetricsRecord>, StoreError>;

    fn save_all(&mut self, records: &[MetricsRecord]) -> Result<(), StoreError>;

    /// The collection as the base of a rewrite. Unlike `load_all`, this must
    /// fail rather than hand back less than is stored.
    fn load_for_update(&self) -> Result<Vec<MetricsRecord>, StoreError> {
        self.load_all()
    }

    fn append(&mut self, record: MetricsRecord) -> Result<usize, StoreError> {
        let mut records = self.load_for_update()?;
        records.push(record);
        self.save_all(&records)?;
        info!(len = records.len(), "appended metrics record");
        Ok(records.len())
    }

    fn remove(&mut self, index: usize) -> Result<MetricsRecord, StoreError> {
        let mut records = self.load_for_update()?;
        if index >= records.len() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: records.len(),
            });
        }
        let removed = records.remove(index);
        self.save_all(&records)?;
        info!(index, len = records.len(), "removed metrics record");
        Ok(removed)
    }
}

/// A history kept as a JSON array in one file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl MetricsStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<MetricsRecord>, StoreError> {
        match self.load_for_update() {
            Err(StoreError::Corrupt { source, .. }) => {
                warn!(path = %self.path.display(), %source, "unreadable metrics store, showing as empty");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn load_for_update(&self) -> Result<Vec<MetricsRecord>, StoreError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&json).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save_all(&mut self, records: &[MetricsRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string(records)?;
        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
                parent
            }
            None => Path::new("."),
        };

        let mut staged = NamedTempFile::new_in(parent).map_err(|err| self.io_error(err))?;
        staged
            .write_all(json.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|err| self.io_error(err))?;
        staged
            .persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }
}

/// An in-process history.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<MetricsRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[MetricsRecord] {
        &self.records
    }
}

impl MetricsStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<MetricsRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn save_all(&mut self, records: &[MetricsRecord]) -> Result<(), StoreError> {
        self.records = records.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> MetricsRecord {
        MetricsRecord {
            image1: format!("{name}-1.png"),
            image2: format!("{name}-2.png"),
            mse: 1.5,
            ..MetricsRecord::default()
        }
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn appends_preserve_order_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = JsonFileStore::new(&path);
        assert_eq!(store.append(record("first")).unwrap(), 1);
        assert_eq!(store.append(record("second")).unwrap(), 2);

        let reopened = JsonFileStore::new(&path);
        let records = reopened.load_all().unwrap();
        assert_eq!(records, vec![record("first"), record("second")]);
    }

    #[test]
    fn file_holds_a_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");
        let mut store = JsonFileStore::new(&path);
        store.append(record("only")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.as_array().unwrap().len(), 1);
        assert_eq!(raw[0]["image1"], "only-1.png");
    }

    #[test]
    fn corrupt_file_shows_empty_but_refuses_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{not json").unwrap();
        let mut store = JsonFileStore::new(&path);

        assert!(store.load_all().unwrap().is_empty());
        assert!(matches!(
            store.append(record("fresh")),
            Err(StoreError::Corrupt { .. })
        ));
        assert!(matches!(store.remove(0), Err(StoreError::Corrupt { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn append_keeps_records_it_cannot_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        // An older record without `hybridMetric`.
        let existing = r#"[{"image1":"x.png","image2":"y.png","mse":1,"psnr":2,"ssim":0.5,"fsim":0.5,"adaptiveMetric":0.4,"likert":0,"mos":0,"kendall":0}]"#;
        std::fs::write(&path, existing).unwrap();

        let mut store = JsonFileStore::new(&path);
        assert!(store.append(MetricsRecord::default()).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), existing);
    }

    #[test]
    fn rewrite_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut store = JsonFileStore::new(&path);
        store.append(record("a")).unwrap();
        store.append(record("b")).unwrap();
        store.remove(0).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(store.load_all().unwrap(), vec![record("b")]);
    }

    #[test]
    fn removes_by_index() {
        let mut store = MemoryStore::new();
        for name in ["a", "b", "c"] {
            store.append(record(name)).unwrap();
        }
        let removed = store.remove(1).unwrap();
        assert_eq!(removed, record("b"));
        assert_eq!(store.records(), &[record("a"), record("c")]);
    }

    #[test]
    fn rejects_out_of_range_removal() {
        let mut store = MemoryStore::new();
        store.append(record("a")).unwrap();
        assert!(matches!(
            store.remove(3),
            Err(StoreError::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert_eq!(store.records().len(), 1);
    }
}
