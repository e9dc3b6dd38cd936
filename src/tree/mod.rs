//! Tree module orchestrator.
//!
//! Flat [`FileRecord`]s go in, a [`FolderTree`] comes out. The tree is built
//! once per layout run and never mutated afterwards.

mod core;
pub mod language;

pub use core::{FileNode, FileRecord, FolderNode, FolderTree, build_tree, fingerprint};
pub use language::{UNKNOWN_LANGUAGE, language_for_path, language_hue};
