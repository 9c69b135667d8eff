use crate::app::cli::{ArchiveCli, PackageCli};
use crate::app::models::{ArchiveConfig, IgnoreRules, PackageConfig};
use anyhow::{bail, Result};

/// Entries left out of a staging copy.
pub const COPY_IGNORE: IgnoreRules = IgnoreRules {
    names: &[".git"],
    prefixes: &[],
};

/// Directories pruned from a release archive.
pub const ARCHIVE_IGNORE: IgnoreRules = IgnoreRules {
    names: &[".git", "__pycache__", ".pytest_cache", ".turbo"],
    prefixes: &["node_modules/.cache", "test-results", "playwright-report"],
};

/// Files with this suffix are never archived.
pub const ARCHIVE_SUFFIX: &str = ".zip";

pub fn resolve_package_config(cli: PackageCli) -> Result<PackageConfig> {
    let Some(src_dir) = cli.src_dir else {
        bail!("--src-dir must be provided or SRC_DIR environment variable must be set");
    };
    let Some(target_dir) = cli.target_dir else {
        bail!("--target-dir must be provided or TARGET_DIR environment variable must be set");
    };

    Ok(PackageConfig {
        src_dir,
        target_dir,
    })
}

pub fn resolve_archive_config(cli: ArchiveCli) -> Result<ArchiveConfig> {
    let Some(src_dir) = cli.src_dir else {
        bail!("--src-dir must be provided or SRC_DIR environment variable must be set");
    };
    let archive_name = cli.archive_name.trim_matches('/').to_string();
    if archive_name.is_empty() {
        bail!("--archive-name must contain a folder name, got {:?}", cli.archive_name);
    }
    if archive_name.split('/').any(|segment| matches!(segment, "" | "." | "..")) {
        bail!("--archive-name must be a relative folder path, got {:?}", cli.archive_name);
    }

    let zip_path = cli
        .zip_path
        .unwrap_or_else(|| src_dir.join(format!("{}{}", archive_name, ARCHIVE_SUFFIX)));

    Ok(ArchiveConfig {
        src_dir,
        archive_name,
        zip_path,
    })
}
