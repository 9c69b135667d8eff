// Declare modules
pub mod archiver;
pub mod cli;
pub mod config;
pub mod copier;
pub mod error;
pub mod models;
pub mod scanner;

use std::process::ExitCode;

use self::archiver::create_release_zip;
use self::cli::{ArchiveCli, PackageCli};
use self::config::{resolve_archive_config, resolve_package_config};
use self::copier::package_release;

/// Installs the stderr logger; `RUST_LOG` overrides the default `warn` level.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();
}

/// Stages a release copy and maps the outcome to a process exit code.
pub fn run_package(args: PackageCli) -> ExitCode {
    let config = match resolve_package_config(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match package_release(&config.src_dir, &config.target_dir) {
        Ok(summary) => {
            log::debug!("{summary:?}");
            println!(
                "Successfully packaged release from {} to {}",
                config.src_dir.display(),
                config.target_dir.display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}: {err}", err.label());
            ExitCode::FAILURE
        }
    }
}

/// Builds the release zip and maps the outcome to a process exit code.
pub fn run_archive(args: ArchiveCli) -> ExitCode {
    let result = resolve_archive_config(args).and_then(|config| {
        let summary = create_release_zip(&config)?;
        Ok(summary)
    });

    match result {
        Ok(summary) => {
            log::info!("Wrote {} entries", summary.entries);
            println!("{}", summary.zip_path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
