use crate::app::config::{ARCHIVE_IGNORE, ARCHIVE_SUFFIX};
use crate::app::error::ArchiveError;
use crate::app::models::{ArchiveConfig, ArchiveEntry, ArchiveSummary, EntryKind};
use crate::app::scanner::Scanner;
use chrono::{Datelike, Local, Timelike};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::SystemTime;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Mode bits stored alongside symlink entries, on top of the link type.
const SYMLINK_PERMISSIONS: u32 = 0o755;

/// Walks `config.src_dir` and writes every eligible entry to `config.zip_path`.
pub fn create_release_zip(config: &ArchiveConfig) -> Result<ArchiveSummary, ArchiveError> {
    let src = &config.src_dir;
    if !src.exists() {
        return Err(ArchiveError::SourceNotFound(src.clone()));
    }
    if !src.is_dir() {
        return Err(ArchiveError::NotADirectory(src.clone()));
    }
    let root = fs::canonicalize(src).map_err(|source| ArchiveError::Read {
        path: src.clone(),
        source,
    })?;

    let entries =
        Scanner::new(root, &config.archive_name, ARCHIVE_IGNORE, ARCHIVE_SUFFIX).scan()?;
    log::info!(
        "Archiving {} entries from {} as {}/",
        entries.len(),
        src.display(),
        config.archive_name
    );

    write_archive(&entries, &config.zip_path)?;

    Ok(ArchiveSummary {
        zip_path: config.zip_path.clone(),
        entries: entries.len(),
    })
}

/// Writes `entries` into a fresh zip at `zip_path`, creating parent directories.
pub fn write_archive(entries: &[ArchiveEntry], zip_path: &Path) -> Result<(), ArchiveError> {
    if let Some(parent) = zip_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ArchiveError::OutputDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file = File::create(zip_path).map_err(|source| ArchiveError::Write {
        path: zip_path.to_path_buf(),
        source,
    })?;
    let mut zip = ZipWriter::new(file);

    for entry in entries {
        match entry.kind {
            EntryKind::File => add_file(&mut zip, entry)?,
            EntryKind::Symlink => add_symlink(&mut zip, entry)?,
        }
        log::debug!("Added {}", entry.archive_path);
    }

    zip.finish()?;
    Ok(())
}

fn add_file(zip: &mut ZipWriter<File>, entry: &ArchiveEntry) -> Result<(), ArchiveError> {
    let read_err = |source: io::Error| ArchiveError::Read {
        path: entry.source.clone(),
        source,
    };
    let meta = fs::metadata(&entry.source).map_err(read_err)?;
    let mut source = File::open(&entry.source).map_err(read_err)?;

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(unix_mode(&meta))
        .last_modified_time(zip_timestamp(meta.modified().ok(), &entry.archive_path));

    zip.start_file(entry.archive_path.as_str(), options)?;
    io::copy(&mut source, zip).map_err(read_err)?;
    Ok(())
}

fn add_symlink(zip: &mut ZipWriter<File>, entry: &ArchiveEntry) -> Result<(), ArchiveError> {
    let read_err = |source: io::Error| ArchiveError::Read {
        path: entry.source.clone(),
        source,
    };
    let meta = fs::symlink_metadata(&entry.source).map_err(read_err)?;
    let target = fs::read_link(&entry.source).map_err(read_err)?;
    let target = target.to_string_lossy().into_owned();

    // add_symlink ORs the symlink type bits into the permissions.
    let options = SimpleFileOptions::default()
        .unix_permissions(SYMLINK_PERMISSIONS)
        .last_modified_time(zip_timestamp(meta.modified().ok(), &entry.archive_path));

    zip.add_symlink(entry.archive_path.as_str(), target.as_str(), options)?;
    Ok(())
}

#[cfg(unix)]
fn unix_mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn unix_mode(meta: &fs::Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

/// Converts a file mtime into a zip timestamp, clamping instead of failing
/// when it falls outside 1980..=2107.
fn zip_timestamp(modified: Option<SystemTime>, name: &str) -> DateTime {
    let Some(modified) = modified else {
        return DateTime::default();
    };
    let local: chrono::DateTime<Local> = modified.into();

    let year = local.year();
    if year < 1980 {
        log::warn!("Clamping timestamp of {} ({}) to 1980-01-01", name, local);
        return DateTime::default();
    }
    if year > 2107 {
        log::warn!("Clamping timestamp of {} ({}) to 2107-12-31", name, local);
        return DateTime::from_date_and_time(2107, 12, 31, 23, 59, 58).unwrap_or_default();
    }

    DateTime::from_date_and_time(
        year as u16,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second().min(59) as u8,
    )
    .unwrap_or_else(|_| {
        log::warn!("Unrepresentable timestamp for {}; using 1980-01-01", name);
        DateTime::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::path::PathBuf;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::tempdir;
    use zip::ZipArchive;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn names(zip_path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(zip_path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    fn config(src: PathBuf, zip_path: PathBuf) -> ArchiveConfig {
        ArchiveConfig {
            src_dir: src,
            archive_name: "sidflow-release".to_string(),
            zip_path,
        }
    }

    #[test]
    fn archives_tree_under_archive_name() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("repo");
        write(&src.join("README.md"), "# sidflow");
        write(&src.join("packages/cli/index.ts"), "export {}");
        write(&src.join(".git/HEAD"), "ref");
        write(&src.join("node_modules/.cache/babel/x.json"), "{}");
        write(&src.join("release.zip"), "PK");
        let zip_path = tmp.path().join("out/nested/release.zip");

        let summary = create_release_zip(&config(src, zip_path.clone())).unwrap();

        assert_eq!(summary.entries, 2);
        assert_eq!(
            names(&zip_path),
            vec![
                "sidflow-release/README.md",
                "sidflow-release/packages/cli/index.ts"
            ]
        );

        let mut archive = ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let mut readme = archive.by_name("sidflow-release/README.md").unwrap();
        assert_eq!(readme.compression(), CompressionMethod::Deflated);
        let mut body = String::new();
        readme.read_to_string(&mut body).unwrap();
        assert_eq!(body, "# sidflow");
    }

    #[test]
    fn default_zip_inside_source_is_not_self_included() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("repo");
        write(&src.join("a.txt"), "a");
        let zip_path = src.join("sidflow-release.zip");

        create_release_zip(&config(src.clone(), zip_path.clone())).unwrap();
        create_release_zip(&config(src, zip_path.clone())).unwrap();

        assert_eq!(names(&zip_path), vec!["sidflow-release/a.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_stored_as_links() {
        use std::os::unix::fs::symlink;

        let tmp = tempdir().unwrap();
        let src = tmp.path().join("repo");
        write(&src.join("bin/real.sh"), "#!/bin/sh\necho hi\n");
        symlink("bin/real.sh", src.join("run.sh")).unwrap();
        let zip_path = tmp.path().join("release.zip");

        create_release_zip(&config(src, zip_path.clone())).unwrap();

        let mut archive = ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        let mut link = archive.by_name("sidflow-release/run.sh").unwrap();
        assert_eq!(link.unix_mode(), Some(0o120755));
        let mut target = String::new();
        link.read_to_string(&mut target).unwrap();
        assert_eq!(target, "bin/real.sh");
    }

    #[test]
    fn missing_and_non_directory_sources_fail() {
        let tmp = tempdir().unwrap();
        let zip_path = tmp.path().join("out.zip");

        let err = create_release_zip(&config(tmp.path().join("absent"), zip_path.clone()))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::SourceNotFound(_)));
        assert!(err.to_string().contains("absent"));

        let file = tmp.path().join("file.txt");
        write(&file, "x");
        let err = create_release_zip(&config(file, zip_path.clone())).unwrap_err();
        assert!(matches!(err, ArchiveError::NotADirectory(_)));
        assert!(!zip_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_fails_without_writing_zip() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().unwrap();
        let src = tmp.path().join("repo");
        write(&src.join("a.txt"), "a");
        let secret = src.join("secret");
        write(&secret.join("s.txt"), "s");
        fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();
        let zip_path = tmp.path().join("release.zip");

        let readable = fs::read_dir(&secret).is_ok();
        let result = create_release_zip(&config(src, zip_path.clone()));
        fs::set_permissions(&secret, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }

        let err = result.unwrap_err();
        assert!(matches!(err, ArchiveError::Walk(_)));
        assert!(err.to_string().contains("secret"));
        assert!(!zip_path.exists());
    }

    #[test]
    fn epoch_zero_mtime_is_clamped() {
        let stamp = zip_timestamp(Some(UNIX_EPOCH), "old.txt");
        assert_eq!(stamp.year(), 1980);
        assert_eq!(stamp.month(), 1);

        let far = UNIX_EPOCH + Duration::from_secs(200 * 365 * 24 * 3600);
        assert_eq!(zip_timestamp(Some(far), "future.txt").year(), 2107);
        assert_eq!(zip_timestamp(None, "unknown.txt").year(), 1980);
    }

    #[test]
    fn epoch_zero_file_still_archives() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("repo");
        let file = src.join("reproducible.txt");
        write(&file, "same bytes");
        filetime::set_file_mtime(&file, filetime::FileTime::from_unix_time(0, 0)).unwrap();
        let zip_path = tmp.path().join("release.zip");

        create_release_zip(&config(src, zip_path.clone())).unwrap();

        assert_eq!(names(&zip_path), vec!["sidflow-release/reproducible.txt"]);
    }
}
