use clap::Parser;
use std::path::PathBuf;

/// Stage a release by copying the repository tree, minus version-control metadata.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct PackageCli {
    /// Source directory (defaults to SRC_DIR environment variable)
    #[arg(long, env = "SRC_DIR")]
    pub src_dir: Option<PathBuf>,

    /// Target directory (defaults to TARGET_DIR environment variable)
    #[arg(long, env = "TARGET_DIR")]
    pub target_dir: Option<PathBuf>,
}

/// Build a release zip from a source tree, pruning caches and VCS metadata.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct ArchiveCli {
    /// Source directory to archive
    #[arg(long, env = "SRC_DIR")]
    pub src_dir: Option<PathBuf>,

    /// Top-level folder name inside the archive
    #[arg(long, env = "ARCHIVE_NAME", default_value = "sidflow-release")]
    pub archive_name: String,

    /// Output zip path (defaults to <src-dir>/<archive-name>.zip)
    #[arg(long, env = "ZIP_PATH")]
    pub zip_path: Option<PathBuf>,
}
