use std::fmt;
use std::path::{Path, PathBuf};

/// Validated settings for a staging copy.
#[derive(Debug, Clone)]
pub struct PackageConfig {
    pub src_dir: PathBuf,
    pub target_dir: PathBuf,
}

/// Validated settings for a release archive run.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub src_dir: PathBuf,
    pub archive_name: String,
    pub zip_path: PathBuf,
}

/// Fixed exclusion rules. Names match the last path segment exactly,
/// prefixes match the start of the POSIX relative path from the walk root.
#[derive(Debug, Clone, Copy)]
pub struct IgnoreRules {
    pub names: &'static [&'static str],
    pub prefixes: &'static [&'static str],
}

impl IgnoreRules {
    pub fn is_ignored_name(&self, name: &str) -> bool {
        self.names.contains(&name)
    }

    /// Returns the subset of one directory listing that must be left out.
    pub fn excluded_names<'a>(&self, entries: &'a [String]) -> Vec<&'a str> {
        entries
            .iter()
            .map(String::as_str)
            .filter(|name| self.is_ignored_name(name))
            .collect()
    }

    /// Directory skip test, applied before descending.
    pub fn should_skip_dir(&self, name: &str, relative_posix: &str) -> bool {
        self.is_ignored_name(name)
            || self
                .prefixes
                .iter()
                .any(|prefix| relative_posix.starts_with(prefix))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Symlink,
}

/// One file or symlink destined for the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub source: PathBuf,
    /// `<archive_name>/<relative path>`, always forward slashes.
    pub archive_path: String,
    pub kind: EntryKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub zip_path: PathBuf,
    pub entries: usize,
}

/// A single entry that could not be copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl CopyFailure {
    pub fn new(path: &Path, reason: impl fmt::Display) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for CopyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CopySummary {
    pub files_copied: usize,
    pub dirs_created: usize,
    pub entries_ignored: usize,
}

/// Joins path components with `/` regardless of host separator.
pub fn to_posix(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
