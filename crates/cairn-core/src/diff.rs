//! Snapshot diff for incremental re-synchronization.
//!
//! A snapshot maps each logical path to the set of content hashes
//! currently stored for it. Comparing the stored snapshot against a
//! fresh loader fetch yields the minimal work set: which paths must be
//! re-written and which must be dropped. Paths whose hash set is
//! identical on both sides are not touched at all, so unchanged content
//! is never re-embedded.
//!
//! Everything in this module is pure; ordering of inputs never affects
//! the result.

use std::collections::{BTreeMap, BTreeSet};

/// Path to the set of content hashes present at that path.
pub type Snapshot = BTreeMap<String, BTreeSet<String>>;

/// Builds a snapshot from (path, content hash) pairs.
///
/// Duplicate pairs collapse; a path listed with several hashes keeps
/// them all.
pub fn snapshot_from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for (path, hash) in entries {
        snapshot.entry(path).or_default().insert(hash);
    }
    snapshot
}

/// Result of comparing a stored snapshot against a fresh fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Paths present in the new fetch whose hash set differs from the
    /// stored one (including paths stored for the first time).
    pub changed: BTreeSet<String>,
    /// Paths present in the stored snapshot but absent from the fetch.
    pub removed: BTreeSet<String>,
}

impl SnapshotDiff {
    /// Paths whose stored chunks must be deleted before inserting:
    /// everything removed plus the old generation of everything changed.
    pub fn delete_paths(&self) -> BTreeSet<String> {
        self.removed.union(&self.changed).cloned().collect()
    }

    pub fn is_noop(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Compares two snapshots.
///
/// A path counts as changed when `new` has it and `old` either lacks it
/// or holds a different hash set (set equality; chunk count growth or
/// shrink at a path therefore counts as changed, there is no partial
/// per-chunk diffing). A path counts as removed when `old` has it and
/// `new` does not.
pub fn diff(old: &Snapshot, new: &Snapshot) -> SnapshotDiff {
    let mut changed = BTreeSet::new();
    for (path, new_hashes) in new {
        match old.get(path) {
            Some(old_hashes) if old_hashes == new_hashes => {}
            _ => {
                changed.insert(path.clone());
            }
        }
    }

    let removed = old
        .keys()
        .filter(|path| !new.contains_key(*path))
        .cloned()
        .collect();

    SnapshotDiff { changed, removed }
}
