use crate::app::config::COPY_IGNORE;
use crate::app::error::PackageError;
use crate::app::models::{CopyFailure, CopySummary, IgnoreRules};
use filetime::{set_file_times, FileTime};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Replaces `target_dir` with a copy of `src_dir`, leaving out `.git` entries.
pub fn package_release(src_dir: &Path, target_dir: &Path) -> Result<CopySummary, PackageError> {
    let src = std::path::absolute(src_dir).map_err(|e| PackageError::from_io(src_dir, e))?;
    let dst = std::path::absolute(target_dir).map_err(|e| PackageError::from_io(target_dir, e))?;

    if !src.exists() {
        return Err(PackageError::SourceNotFound(src));
    }
    if !src.is_dir() {
        return Err(PackageError::NotADirectory(src));
    }
    let src = fs::canonicalize(&src).map_err(|e| PackageError::from_io(&src, e))?;

    if fs::symlink_metadata(&dst).is_ok() {
        log::debug!("Removing existing target {}", dst.display());
        remove_existing(&dst).map_err(|e| PackageError::from_io(&dst, e))?;
    }
    fs::create_dir_all(&dst).map_err(|e| PackageError::from_io(&dst, e))?;
    let dst_canonical = fs::canonicalize(&dst).map_err(|e| PackageError::from_io(&dst, e))?;

    let mut copier = TreeCopier {
        rules: COPY_IGNORE,
        dst_root: dst_canonical,
        ancestors: HashSet::new(),
        summary: CopySummary::default(),
        failures: Vec::new(),
    };
    copier.copy_dir(&src, &dst);

    if !copier.failures.is_empty() {
        return Err(PackageError::Copy(copier.failures));
    }
    log::info!(
        "Copied {} files into {} directories ({} entries ignored)",
        copier.summary.files_copied,
        copier.summary.dirs_created,
        copier.summary.entries_ignored
    );
    Ok(copier.summary)
}

fn remove_existing(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

struct TreeCopier {
    rules: IgnoreRules,
    dst_root: PathBuf,
    /// Canonical directories on the current recursion path.
    ancestors: HashSet<PathBuf>,
    summary: CopySummary,
    failures: Vec<CopyFailure>,
}

impl TreeCopier {
    /// Copies the children of `src` into the already existing `dst`.
    /// Only a directory that is its own ancestor counts as a loop; the same
    /// directory reached through sibling links is copied each time.
    fn copy_dir(&mut self, src: &Path, dst: &Path) {
        let real = match fs::canonicalize(src) {
            Ok(real) => real,
            Err(e) => {
                self.failures.push(CopyFailure::new(src, e));
                return;
            }
        };
        if !self.ancestors.insert(real.clone()) {
            self.failures.push(CopyFailure::new(src, "symlink loop detected"));
            return;
        }
        self.copy_children(src, dst);
        self.ancestors.remove(&real);
    }

    fn copy_children(&mut self, src: &Path, dst: &Path) {
        let names = match list_names(src) {
            Ok(names) => names,
            Err(e) => {
                self.failures.push(CopyFailure::new(src, e));
                return;
            }
        };
        let excluded = self.rules.excluded_names(&names);
        self.summary.entries_ignored += excluded.len();

        for name in &names {
            if excluded.contains(&name.as_str()) {
                log::debug!("Ignoring {}", src.join(name).display());
                continue;
            }
            let src_path = src.join(name);
            let dst_path = dst.join(name);

            // Follows symlinks, like a plain recursive copy.
            let meta = match fs::metadata(&src_path) {
                Ok(meta) => meta,
                Err(e) => {
                    self.failures.push(CopyFailure::new(&src_path, e));
                    continue;
                }
            };

            if meta.is_dir() {
                if self.is_target_root(&src_path) {
                    log::debug!("Skipping target directory {}", src_path.display());
                    continue;
                }
                if let Err(e) = fs::create_dir(&dst_path) {
                    self.failures.push(CopyFailure::new(&dst_path, e));
                    continue;
                }
                self.summary.dirs_created += 1;
                self.copy_dir(&src_path, &dst_path);
                if let Err(e) = fs::set_permissions(&dst_path, meta.permissions()) {
                    log::warn!("Could not copy permissions to {}: {}", dst_path.display(), e);
                }
            } else {
                match copy_file_with_times(&src_path, &dst_path, &meta) {
                    Ok(()) => self.summary.files_copied += 1,
                    Err(e) => {
                        log::warn!("Failed to copy {}: {}", src_path.display(), e);
                        self.failures.push(CopyFailure::new(&src_path, e));
                    }
                }
            }
        }
    }

    fn is_target_root(&self, path: &Path) -> bool {
        fs::canonicalize(path).is_ok_and(|real| real == self.dst_root)
    }
}

fn list_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<io::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}

fn copy_file_with_times(src: &Path, dst: &Path, meta: &fs::Metadata) -> io::Result<()> {
    fs::copy(src, dst)?;
    set_file_times(
        dst,
        FileTime::from_last_access_time(meta),
        FileTime::from_last_modification_time(meta),
    )
}
