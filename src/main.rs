use clap::Parser;
use heattrader::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
