//! Assigns integer indices to external identifiers, per idtype.
//!
//! The range engine only knows integer positions; these assigners translate
//! between them and opaque identifiers such as gene names.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use std::time::SystemTime;

use anyhow::{anyhow, Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::lock::FileLock;
use crate::range::Range1D;

pub const MAPPING_FILE_NAME: &str = "mapping.json";

/// One search result: the assigned index and the external name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    pub name: String,
}

pub trait IdAssigner: Send + Sync {
    /// Index for every id, allocating the next free index for unseen ones.
    fn assign(&self, ids: &[String], idtype: &str) -> Result<Vec<i64>>;

    /// External id for every index, `None` when the index was never assigned.
    fn unmap(&self, uids: &[i64], idtype: &str) -> Result<Vec<Option<String>>>;

    /// Replace everything known about `idtype` with `mapping`.
    fn load(&self, idtype: &str, mapping: &[(String, i64)]) -> Result<()>;

    /// Case-insensitive substring search over the known ids.
    fn search(&self, idtype: &str, query: &str, max_results: Option<usize>)
        -> Result<Vec<SearchHit>>;

    /// Unmap every index a range selects.
    fn unmap_range(&self, range: &Range1D, idtype: &str) -> Result<Vec<Option<String>>> {
        let uids = range.to_vec(None)?;
        self.unmap(&uids, idtype)
    }
}

/// Name to index table of one idtype.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct IdTable {
    by_name: BTreeMap<String, i64>,
}

impl IdTable {
    fn from_mapping(mapping: &[(String, i64)]) -> Self {
        Self {
            by_name: mapping.iter().cloned().collect(),
        }
    }

    /// Returns the indices and how many were newly allocated.
    fn assign(&mut self, ids: &[String]) -> (Vec<i64>, usize) {
        let mut next = self.by_name.values().max().map_or(0, |max| max + 1);
        let mut allocated = 0;
        let mut result = Vec::with_capacity(ids.len());
        for id in ids {
            let index = *self.by_name.entry(id.clone()).or_insert_with(|| {
                allocated += 1;
                next += 1;
                next - 1
            });
            result.push(index);
        }
        (result, allocated)
    }

    fn unmap(&self, uids: &[i64]) -> Vec<Option<String>> {
        let by_index: HashMap<i64, &String> =
            self.by_name.iter().map(|(name, &i)| (i, name)).collect();
        uids.iter()
            .map(|uid| by_index.get(uid).map(|name| name.to_string()))
            .collect()
    }

    fn search(&self, query: &str, max_results: Option<usize>) -> Vec<SearchHit> {
        let query = query.to_lowercase();
        self.by_name
            .iter()
            .filter(|(name, _)| name.to_lowercase().contains(&query))
            .take(max_results.unwrap_or(usize::MAX))
            .map(|(name, &id)| SearchHit {
                id,
                name: name.clone(),
            })
            .collect()
    }
}

/// Keeps assignments in memory only.
#[derive(Debug, Default)]
pub struct MemoryIdAssigner {
    tables: RwLock<HashMap<String, IdTable>>,
}

impl MemoryIdAssigner {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("id assigner lock poisoned")
}

impl IdAssigner for MemoryIdAssigner {
    fn assign(&self, ids: &[String], idtype: &str) -> Result<Vec<i64>> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let (result, allocated) = tables.entry(idtype.to_string()).or_default().assign(ids);
        log::debug!("assigned {} new id(s) to {}", allocated, idtype);
        Ok(result)
    }

    fn unmap(&self, uids: &[i64], idtype: &str) -> Result<Vec<Option<String>>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(match tables.get(idtype) {
            Some(table) => table.unmap(uids),
            None => vec![None; uids.len()],
        })
    }

    fn load(&self, idtype: &str, mapping: &[(String, i64)]) -> Result<()> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.insert(idtype.to_string(), IdTable::from_mapping(mapping));
        Ok(())
    }

    fn search(
        &self,
        idtype: &str,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<SearchHit>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .get(idtype)
            .map(|table| table.search(query, max_results))
            .unwrap_or_default())
    }
}

type Tables = HashMap<String, IdTable>;

/// Modification time and length of the mapping file, `None` while it does
/// not exist.
type Stamp = Option<(SystemTime, u64)>;

fn stamp(path: &Path) -> Result<Stamp> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some((meta.modified()?, meta.len()))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Tables as last seen on disk.
#[derive(Debug)]
struct Snapshot {
    stamp: Stamp,
    tables: Tables,
}

/// Persists assignments as a JSON document, loaded lazily on first use.
///
/// Every change re-reads the document while holding its lock file, so
/// several processes sharing a data directory never hand out the same
/// index twice.
#[derive(Debug)]
pub struct FileIdAssigner {
    path: PathBuf,
    cache: Mutex<Option<Snapshot>>,
}

impl FileIdAssigner {
    /// Assigner backed by `mapping.json` inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(MAPPING_FILE_NAME),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Snapshot> {
        let stamp = stamp(&self.path)?;
        if stamp.is_none() {
            return Ok(Snapshot {
                stamp,
                tables: Tables::new(),
            });
        }
        log::debug!("Loading id mapping from {}", self.path.display());
        let content = fs::read_to_string(&self.path)?;
        let tables = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(Snapshot { stamp, tables })
    }

    /// Replace the document in one rename so readers never see half of it.
    fn write(&self, tables: &Tables) -> Result<()> {
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_string_pretty(tables)?)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    /// Run `f` on the current tables, reloading them if the file changed.
    fn view<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T> {
        let mut cache = self.cache.lock().map_err(poisoned)?;
        let current = stamp(&self.path)?;
        let snapshot = match cache.take() {
            Some(snapshot) if snapshot.stamp == current => snapshot,
            _ => self.read()?,
        };
        let value = f(&snapshot.tables);
        *cache = Some(snapshot);
        Ok(value)
    }

    /// Run `f` on freshly read tables under the lock file, writing them back
    /// if it asks to. The cache only changes once the write succeeded.
    fn update<T>(&self, f: impl FnOnce(&mut Tables) -> (T, bool)) -> Result<T> {
        let mut cache = self.cache.lock().map_err(poisoned)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let _lock = FileLock::acquire(&self.path)?;
        let mut snapshot = self.read()?;
        let (value, dirty) = f(&mut snapshot.tables);
        if dirty {
            self.write(&snapshot.tables)?;
            snapshot.stamp = stamp(&self.path)?;
        }
        *cache = Some(snapshot);
        Ok(value)
    }
}

impl IdAssigner for FileIdAssigner {
    fn assign(&self, ids: &[String], idtype: &str) -> Result<Vec<i64>> {
        let known: Option<Vec<i64>> = self.view(|tables| {
            let table = tables.get(idtype)?;
            ids.iter().map(|id| table.by_name.get(id).copied()).collect()
        })?;
        if let Some(uids) = known {
            return Ok(uids);
        }
        self.update(|tables| {
            let (result, allocated) = tables.entry(idtype.to_string()).or_default().assign(ids);
            if allocated > 0 {
                log::debug!("add missing to {} {}", idtype, allocated);
            }
            (result, allocated > 0)
        })
    }

    fn unmap(&self, uids: &[i64], idtype: &str) -> Result<Vec<Option<String>>> {
        self.view(|tables| match tables.get(idtype) {
            Some(table) => table.unmap(uids),
            None => vec![None; uids.len()],
        })
    }

    fn load(&self, idtype: &str, mapping: &[(String, i64)]) -> Result<()> {
        self.update(|tables| {
            tables.insert(idtype.to_string(), IdTable::from_mapping(mapping));
            ((), true)
        })
    }

    fn search(
        &self,
        idtype: &str,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<SearchHit>> {
        self.view(|tables| {
            tables
                .get(idtype)
                .map(|table| table.search(query, max_results))
                .unwrap_or_default()
        })
    }
}
