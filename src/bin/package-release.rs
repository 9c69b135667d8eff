use clap::Parser;
use release_pack::app::{self, cli::PackageCli};
use std::process::ExitCode;

fn main() -> ExitCode {
    app::init_logging();
    app::run_package(PackageCli::parse())
}
