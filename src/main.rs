use clap::Parser;
use stockpile::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
