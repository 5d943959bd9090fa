//! Last-writer-wins reconciliation of two collections.
//!
//! Records are matched by `id`. When both sides hold a record, the copy with
//! the strictly larger `updated_at` wins; on an exact tie the copy seen
//! first (local) stays. Records present on only one side are always kept:
//! there are no tombstones, so a deletion on one device does not propagate
//! and can be undone by a later merge with a device that still has the
//! record.

use shelfsync_codec::Record;
use std::collections::{HashMap, HashSet};

/// Which copy survived for one identity present on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The local copy was newer or tied.
    KeepLocal,
    /// The remote copy was strictly newer.
    AcceptRemote,
}

/// Result of a merge with per-identity bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Merged collection, newest first.
    pub records: Vec<Record>,
    /// Identities present only on the remote side.
    pub added_from_remote: usize,
    /// Identities on both sides where the remote copy won.
    pub replaced_by_remote: usize,
}

/// Merges `local` and `remote` into one collection sorted by `updated_at`
/// descending.
///
/// Records with an empty `id` are dropped.
pub fn merge(local: &[Record], remote: &[Record]) -> Vec<Record> {
    merge_with_report(local, remote).records
}

/// Like [`merge`], also counting what the remote side contributed.
pub fn merge_with_report(local: &[Record], remote: &[Record]) -> MergeReport {
    let mut records: Vec<Record> = Vec::with_capacity(local.len() + remote.len());
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut local_ids: HashSet<&str> = HashSet::new();
    let mut added_from_remote = 0;
    let mut replaced_by_remote = 0;

    for record in local.iter().filter(|r| !r.id.is_empty()) {
        local_ids.insert(record.id.as_str());
        match positions.get(record.id.as_str()) {
            Some(&pos) => {
                if record.updated_at > records[pos].updated_at {
                    records[pos] = record.clone();
                }
            }
            None => {
                positions.insert(record.id.as_str(), records.len());
                records.push(record.clone());
            }
        }
    }

    for record in remote.iter().filter(|r| !r.id.is_empty()) {
        match positions.get(record.id.as_str()) {
            Some(&pos) => {
                if resolve(&records[pos], record) == Resolution::AcceptRemote {
                    records[pos] = record.clone();
                    if local_ids.contains(record.id.as_str()) {
                        replaced_by_remote += 1;
                    }
                }
            }
            None => {
                positions.insert(record.id.as_str(), records.len());
                records.push(record.clone());
                added_from_remote += 1;
            }
        }
    }

    // Stable: equal timestamps keep first-seen order.
    records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    MergeReport {
        records,
        added_from_remote,
        replaced_by_remote,
    }
}

/// Decides between the currently selected copy and a remote candidate.
pub fn resolve(selected: &Record, remote: &Record) -> Resolution {
    if remote.updated_at > selected.updated_at {
        Resolution::AcceptRemote
    } else {
        Resolution::KeepLocal
    }
}
