//! BuildSense CLI
//!
//! `buildsense [--home DIR] <command>`; see `buildsense --help`.

use buildsense::cli::{run_cli, Cli};
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    std::process::exit(run_cli(cli));
}
