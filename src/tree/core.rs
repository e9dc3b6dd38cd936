use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::building::trimmed_average;
use crate::config::LayoutConfig;
use crate::error::LayoutWarning;
use crate::logging::{LogLevel, TARGET_TREE, event_with_fields, json_kv, json_str};
use crate::tree::language::language_for_path;

/// Metrics for one source file, as handed over by the analysis step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub lines_of_code: u64,
    #[serde(default)]
    pub avg_line_length: f64,
    #[serde(default)]
    pub line_lengths: Vec<u32>,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_modified: DateTime<Utc>,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, lines_of_code: u64) -> Self {
        Self {
            path: path.into(),
            lines_of_code,
            avg_line_length: 0.0,
            line_lengths: Vec::new(),
            language: String::new(),
            created_at: DateTime::<Utc>::default(),
            last_modified: DateTime::<Utc>::default(),
        }
    }

    /// Sets per-line lengths and derives the average from them.
    pub fn with_line_lengths(mut self, line_lengths: Vec<u32>) -> Self {
        self.avg_line_length = if line_lengths.is_empty() {
            0.0
        } else {
            line_lengths.iter().map(|v| *v as f64).sum::<f64>() / line_lengths.len() as f64
        };
        self.line_lengths = line_lengths;
        self
    }

    pub fn with_avg_line_length(mut self, avg: f64) -> Self {
        self.avg_line_length = avg;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, last_modified: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.last_modified = last_modified;
        self
    }
}

/// A file inside the folder tree, with its language and average resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct FileNode {
    pub path: String,
    pub name: String,
    pub record: FileRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FolderNode {
    /// Components joined by `/`; empty for the root.
    pub path: String,
    pub name: String,
    pub depth: u32,
    pub files: Vec<FileNode>,
    pub folders: Vec<FolderNode>,
}

impl FolderNode {
    fn new(path: String, name: String, depth: u32) -> Self {
        Self {
            path,
            name,
            depth,
            files: Vec::new(),
            folders: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn subfolder_count(&self) -> usize {
        self.folders.len()
    }

    /// Files in this folder and every folder below it.
    pub fn descendant_count(&self) -> usize {
        self.files.len()
            + self
                .folders
                .iter()
                .map(FolderNode::descendant_count)
                .sum::<usize>()
    }

    /// Number of folders in this subtree, including this one.
    pub fn folder_count(&self) -> usize {
        1 + self.folders.iter().map(FolderNode::folder_count).sum::<usize>()
    }

    pub fn find(&self, path: &str) -> Option<&FolderNode> {
        if self.path == path {
            return Some(self);
        }
        self.folders.iter().find_map(|folder| folder.find(path))
    }

    fn child_mut(&mut self, name: &str) -> &mut FolderNode {
        let idx = match self.folders.iter().position(|f| f.name == name) {
            Some(idx) => idx,
            None => {
                let path = if self.path.is_empty() {
                    name.to_string()
                } else {
                    format!("{}/{}", self.path, name)
                };
                self.folders
                    .push(FolderNode::new(path, name.to_string(), self.depth + 1));
                self.folders.len() - 1
            }
        };
        &mut self.folders[idx]
    }
}

/// Folder hierarchy plus the anomalies met while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderTree {
    pub root: FolderNode,
    pub warnings: Vec<LayoutWarning>,
}

/// Builds the folder hierarchy from flat records, preserving input order.
///
/// Records with an empty path or an empty component (`a//b`, `/a`, `a/`) and
/// repeated paths are skipped, each with a warning.
pub fn build_tree(records: &[FileRecord], root_name: &str, config: &LayoutConfig) -> FolderTree {
    let mut root = FolderNode::new(String::new(), root_name.to_string(), 0);
    let mut warnings = Vec::new();
    let mut seen = std::collections::BTreeSet::new();

    for record in records {
        let components: Vec<&str> = record.path.split(config.path_delimiter).collect();
        if record.path.is_empty() || components.iter().any(|c| c.is_empty()) {
            warnings.push(LayoutWarning::MalformedPathEntry {
                path: record.path.clone(),
            });
            continue;
        }

        let normalized = components.join("/");
        if !seen.insert(normalized.clone()) {
            warnings.push(LayoutWarning::DuplicatePathEntry { path: normalized });
            continue;
        }

        let Some((file_name, folders)) = components.split_last() else {
            continue;
        };
        let mut folder = &mut root;
        for name in folders {
            folder = folder.child_mut(name);
        }

        let mut resolved = record.clone();
        resolved.path = normalized.clone();
        if resolved.language.trim().is_empty() {
            resolved.language = language_for_path(file_name).to_string();
        }
        if !(resolved.avg_line_length > 0.0) {
            resolved.avg_line_length = trimmed_average(&resolved.line_lengths);
        }
        folder.files.push(FileNode {
            path: normalized,
            name: file_name.to_string(),
            record: resolved,
        });
    }

    for warning in &warnings {
        config.emit(event_with_fields(
            LogLevel::Warn,
            TARGET_TREE,
            "skipped_record",
            [
                json_str("path", warning.path()),
                json_str("reason", warning.to_string()),
            ],
        ));
    }
    config.emit(event_with_fields(
        LogLevel::Debug,
        TARGET_TREE,
        "tree_built",
        [
            json_kv("files", root.descendant_count()),
            json_kv("folders", root.folder_count() - 1),
            json_kv("skipped", warnings.len()),
        ],
    ));

    FolderTree { root, warnings }
}

/// Stable digest of the layout input, for keying external caches.
pub fn fingerprint(records: &[FileRecord], root_name: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(root_name.as_bytes());
    hasher.update(&[0]);
    for record in records {
        hasher.update(record.path.as_bytes());
        hasher.update(&[0]);
        hasher.update(&record.lines_of_code.to_le_bytes());
        hasher.update(&record.avg_line_length.to_bits().to_le_bytes());
        hasher.update(&(record.line_lengths.len() as u64).to_le_bytes());
        for len in &record.line_lengths {
            hasher.update(&len.to_le_bytes());
        }
        hasher.update(record.language.as_bytes());
        hasher.update(&[0]);
        hasher.update(record.created_at.to_rfc3339().as_bytes());
        hasher.update(record.last_modified.to_rfc3339().as_bytes());
        hasher.update(&[0xff]);
    }
    hasher.finalize().to_hex().to_string()
}
