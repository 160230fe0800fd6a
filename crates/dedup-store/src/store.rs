//! The dedup store itself.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use alert_core::{ChannelId, DeliveryLedger};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::record::{DeliveryRecord, StateFile, STATE_VERSION};

#[derive(Serialize)]
struct StateFileRef<'a> {
    version: u32,
    alerts: &'a BTreeMap<String, DeliveryRecord>,
}

/// Persistent mapping from alert id to [`DeliveryRecord`].
///
/// The in-memory map is authoritative: a failed [`persist`](Self::persist)
/// leaves it untouched and the next successful write catches up.
#[derive(Debug)]
pub struct DedupStore {
    path: PathBuf,
    records: BTreeMap<String, DeliveryRecord>,
}

impl DedupStore {
    /// Open the store at `path`, loading whatever usable state is there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = load_records(&path);
        info!(path = %path.display(), alerts = records.len(), "Loaded dedup state");
        Self { path, records }
    }

    /// An empty store that will write to `path`, ignoring existing content.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: BTreeMap::new(),
        }
    }

    /// Location of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of tracked alert ids.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no alert ids are tracked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record for one alert id.
    pub fn get(&self, alert_id: &str) -> Option<&DeliveryRecord> {
        self.records.get(alert_id)
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Remove records whose `last_touched` is older than `now - retention`.
    ///
    /// Returns how many records were removed.
    pub fn prune(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let Ok(retention) = chrono::Duration::from_std(retention) else {
            return 0;
        };
        let Some(cutoff) = now.checked_sub_signed(retention) else {
            return 0;
        };

        let before = self.records.len();
        self.records.retain(|_, record| record.last_touched >= cutoff);
        let removed = before - self.records.len();

        if removed > 0 {
            debug!(removed, remaining = self.records.len(), "Pruned dedup records");
        }
        removed
    }

    /// Atomically write the full mapping to the state file.
    ///
    /// Writes to a temp file in the same directory and renames it over the
    /// target, so readers never observe a partial file.
    pub fn persist(&self) -> Result<()> {
        let state = StateFileRef {
            version: STATE_VERSION,
            alerts: &self.records,
        };
        let data = serde_json::to_vec_pretty(&state)?;
        atomic_write(&self.path, &data)?;
        debug!(path = %self.path.display(), alerts = self.records.len(), "Persisted dedup state");
        Ok(())
    }
}

impl DeliveryLedger for DedupStore {
    fn has_notified(&self, alert_id: &str, channel_id: ChannelId) -> bool {
        self.records
            .get(alert_id)
            .is_some_and(|record| record.channels_notified.contains(&channel_id))
    }

    fn record(&mut self, alert_id: &str, channel_id: ChannelId, now: DateTime<Utc>) {
        let record = self
            .records
            .entry(alert_id.to_string())
            .or_insert_with(|| DeliveryRecord::new(now));
        record.channels_notified.insert(channel_id);
        record.last_touched = now;
    }
}

/// Read the state file at `path`.
///
/// A missing file is a first run. An unreadable, corrupt or foreign-version
/// file only costs dedup history, so it degrades to an empty map with a
/// warning instead of failing.
pub fn load_records(path: &Path) -> BTreeMap<String, DeliveryRecord> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No dedup state file, starting empty");
            return BTreeMap::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read dedup state, starting empty");
            return BTreeMap::new();
        }
    };

    match serde_json::from_slice::<StateFile>(&data) {
        Ok(state) if state.version == STATE_VERSION => state.alerts,
        Ok(state) => {
            warn!(
                path = %path.display(),
                version = state.version,
                expected = STATE_VERSION,
                "Incompatible dedup state version, starting empty"
            );
            BTreeMap::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable dedup state format, starting empty");
            BTreeMap::new()
        }
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Persist {
        path: path.display().to_string(),
        source: e.error,
    })?;
    Ok(())
}
