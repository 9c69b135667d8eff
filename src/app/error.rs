use crate::app::models::CopyFailure;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("Source path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("{}: {source}", .path.display())]
    Permission {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}", join_failures(.0))]
    Copy(Vec<CopyFailure>),
    #[error("{}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PackageError {
    /// Classifies a setup-stage I/O failure on `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::Permission { path, source }
        } else {
            Self::Filesystem { path, source }
        }
    }

    /// Prefix of the line printed to stderr for this failure.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SourceNotFound(_) | Self::NotADirectory(_) => "Error",
            Self::Permission { .. } => "Permission error",
            Self::Copy(_) => "Copy error",
            Self::Filesystem { .. } => "Filesystem error",
        }
    }
}

fn join_failures(failures: &[CopyFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("Source path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("failed to create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] ignore::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}
