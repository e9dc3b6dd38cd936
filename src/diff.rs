//! Path-set comparison between two analysis snapshots.
//!
//! Layouts are always recomputed from scratch; this only tells a live-reload
//! collaborator whether recomputing is worth it and which paths to highlight.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::tree::FileRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileSetDiff {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub modified: BTreeSet<String>,
}

impl FileSetDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn all_changed(&self) -> BTreeSet<String> {
        self.added
            .iter()
            .chain(&self.removed)
            .chain(&self.modified)
            .cloned()
            .collect()
    }
}

/// Paths present in `records`, in sorted order.
pub fn path_set(records: &[FileRecord]) -> BTreeSet<String> {
    records.iter().map(|r| r.path.clone()).collect()
}

/// Added and removed paths come from the sets alone. A path only counts as
/// modified when a watcher hinted at it and it exists on both sides.
pub fn diff_file_sets(
    old: &BTreeSet<String>,
    new: &BTreeSet<String>,
    modified_hints: Option<&BTreeSet<String>>,
) -> FileSetDiff {
    let modified = modified_hints
        .map(|hints| {
            hints
                .iter()
                .filter(|path| old.contains(*path) && new.contains(*path))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    FileSetDiff {
        added: new.difference(old).cloned().collect(),
        removed: old.difference(new).cloned().collect(),
        modified,
    }
}
