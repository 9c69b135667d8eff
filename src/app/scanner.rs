use crate::app::error::ArchiveError;
use crate::app::models::{to_posix, ArchiveEntry, EntryKind, IgnoreRules};
use ignore::{DirEntry, WalkBuilder};
use pathdiff::diff_paths;
use std::path::{Path, PathBuf};

/// Pre-order walk of a source tree that prunes ignored directories before
/// descending and never follows symlinks.
pub struct Scanner {
    root: PathBuf,
    archive_name: String,
    rules: IgnoreRules,
    skip_suffix: &'static str,
}

impl Scanner {
    pub fn new(
        root: PathBuf,
        archive_name: &str,
        rules: IgnoreRules,
        skip_suffix: &'static str,
    ) -> Self {
        Self {
            root,
            archive_name: archive_name.trim_matches('/').to_string(),
            rules,
            skip_suffix,
        }
    }

    /// Any unreadable entry aborts the scan so no archive is written incomplete.
    pub fn scan(&self) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        if self.root_is_ignored() {
            log::warn!(
                "Source root {} matches an ignored directory name; nothing to archive",
                self.root.display()
            );
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();

        let root = self.root.clone();
        let rules = self.rules;
        // Every standard filter is off: only the fixed rules decide what is pruned.
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| !is_pruned(entry, &root, &rules))
            .build();

        for result in walker {
            let entry = result?;
            if let Some(processed) = self.process_entry(&entry) {
                entries.push(processed);
            }
        }

        Ok(entries)
    }

    fn root_is_ignored(&self) -> bool {
        self.root
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.rules.is_ignored_name(name))
    }

    fn process_entry(&self, entry: &DirEntry) -> Option<ArchiveEntry> {
        let file_type = entry.file_type()?;
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            return None;
        };

        let name = entry.file_name().to_string_lossy();
        if name.ends_with(self.skip_suffix) {
            log::debug!("Skipping archive artifact {}", entry.path().display());
            return None;
        }

        let relative = diff_paths(entry.path(), &self.root)?;
        Some(ArchiveEntry {
            source: entry.path().to_path_buf(),
            archive_path: format!("{}/{}", self.archive_name, to_posix(&relative)),
            kind,
        })
    }
}

/// The walker never offers the root (depth 0) to this filter.
fn is_pruned(entry: &DirEntry, root: &Path, rules: &IgnoreRules) -> bool {
    if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
        return false;
    }
    let Some(relative) = diff_paths(entry.path(), root) else {
        return false;
    };
    let name = entry.file_name().to_string_lossy();
    let pruned = rules.should_skip_dir(&name, &to_posix(&relative));
    if pruned {
        log::debug!("Pruning {}", entry.path().display());
    }
    pruned
}
