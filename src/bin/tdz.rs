#![allow(clippy::print_stderr)]

use clap::Parser;
use tdz::cli::CliArgs;

fn main() {
    // Initialize tracing if TDZ_LOG or RUST_LOG is set (zero cost otherwise).
    // TDZ_LOG_FORMAT=tree switches to hierarchical output.
    tdz::tracing_config::init_tracing();

    let args = CliArgs::parse();
    std::process::exit(tdz::cli::run(&args));
}
