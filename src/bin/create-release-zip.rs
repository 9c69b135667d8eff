use clap::Parser;
use release_pack::app::{self, cli::ArchiveCli};
use std::process::ExitCode;

fn main() -> ExitCode {
    app::init_logging();
    app::run_archive(ArchiveCli::parse())
}
