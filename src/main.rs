use clap::Parser;
use marketsieve::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
