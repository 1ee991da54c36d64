//! Content-addressed store for interpolation tables.
//!
//! Tables are keyed by a kind label and the hash of everything that
//! determines their content. Every table lives in a process-wide memory
//! cache; when a table directory is configured it is also written there as
//! `<kind>_<hash>.json` and read back by later processes.

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;

type CachedTable = Arc<dyn Any + Send + Sync>;

// Global cache for tables to avoid rebuilding them for every cross section
static GLOBAL_TABLE_CACHE: Lazy<Mutex<HashMap<String, CachedTable>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn cache() -> MutexGuard<'static, HashMap<String, CachedTable>> {
    GLOBAL_TABLE_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cache key and file stem of a table.
pub fn table_key(kind: &str, hash: u64) -> String {
    format!("{}_{:016x}", kind, hash)
}

/// File a table is persisted to inside `dir`.
pub fn table_path(dir: &Path, kind: &str, hash: u64) -> PathBuf {
    dir.join(format!("{}.json", table_key(kind, hash)))
}

/// Drop every table held in memory. Files on disk are left alone.
pub fn clear_table_cache() {
    cache().clear();
}

/// Number of tables currently held in memory.
pub fn cached_table_count() -> usize {
    cache().len()
}

/// Return the table for `(kind, hash)`, building it at most once.
///
/// Lookup order is memory, then `table_dir`, then `build`. A freshly built
/// table is written to `table_dir`; failing to write only logs a warning,
/// the table is still returned and cached in memory. Two threads asking for
/// the same missing table may both build it; the first one inserted wins.
pub fn get_or_build<T, F>(kind: &str, hash: u64, table_dir: Option<&Path>, build: F) -> Arc<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
    F: FnOnce() -> T,
{
    let key = table_key(kind, hash);

    // Fast path: already in memory
    if let Some(existing) = cache().get(&key) {
        if let Ok(table) = Arc::clone(existing).downcast::<T>() {
            return table;
        }
        log::warn!("Cached table {} has an unexpected type, rebuilding", key);
    }

    let loaded = table_dir.and_then(|dir| load_table::<T>(&table_path(dir, kind, hash)));
    let table = match loaded {
        Some(table) => table,
        None => {
            log::info!("Building table {}", key);
            let table = build();
            if let Some(dir) = table_dir {
                match store_table(dir, &key, &table) {
                    Ok(path) => log::info!("Saved table {} to {:?}", key, path),
                    Err(e) => log::warn!(
                        "Could not save table {} to {:?}, keeping it in memory only: {}",
                        key,
                        dir,
                        e
                    ),
                }
            }
            table
        }
    };

    let mut cache = cache();
    if let Some(existing) = cache.get(&key) {
        if let Ok(winner) = Arc::clone(existing).downcast::<T>() {
            return winner;
        }
    }
    let table = Arc::new(table);
    cache.insert(key, Arc::clone(&table) as CachedTable);
    table
}

fn load_table<T: DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        return None;
    }
    match read_table(path) {
        Ok(table) => {
            log::info!("Loaded table from {:?}", path);
            Some(table)
        }
        Err(e) => {
            log::warn!("Ignoring unreadable table {:?}: {}", path, e);
            None
        }
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = fs::File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Write `table` to `<dir>/<key>.json`, creating `dir` if needed. The file is
/// written under a temporary name first and renamed into place.
fn store_table<T: Serialize>(dir: &Path, key: &str, table: &T) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.json", key));
    let tmp = dir.join(format!("{}.json.{}.tmp", key, std::process::id()));
    {
        let mut writer = BufWriter::new(fs::File::create(&tmp)?);
        serde_json::to_writer(&mut writer, table)?;
        writer.flush()?;
    }
    fs::rename(&tmp, &path)?;
    Ok(path)
}
