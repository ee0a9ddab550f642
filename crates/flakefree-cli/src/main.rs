//! Flakefree CLI: race-free end-to-end login-flow suite
//!
//! ## Usage
//!
//! ```bash
//! flakefree list                                  # Show scenarios and tags
//! flakefree run                                   # Run every scenario
//! flakefree run --grep @c3                        # Run one scenario
//! flakefree run --base-url http://localhost:8080 --headed
//! flakefree run --json > report.json              # Machine-readable report
//! ```

use clap::Parser;
use flakefree_cli::{logging, Cli, CliConfig, CliResult, Commands, SuiteRunner, Verbosity};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    logging::init(&config);

    let runner = SuiteRunner::new(&config);
    match cli.command {
        Commands::Run(args) => runner.run(&args),
        Commands::List(args) => runner.list(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_log_json(cli.log_json)
}
