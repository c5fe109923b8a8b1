use std::process::ExitCode;

use anyhow::Context;
use clap::CommandFactory;
use clap::Parser;
use ets_cli::Cli;
use ets_cli::Invocation;
use ets_cli::login_shell;
use ets_cli::resolve_invocation;
use ets_core::Config;
use ets_core::print_stdin;
use ets_core::run_command;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "ETS_LOG";

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    if cli.print_version {
        println!("{}", Cli::command().render_version().trim_end());
        return ExitCode::SUCCESS;
    }
    match run(cli) {
        Ok(code) => exit_code(code),
        Err(err) => {
            eprintln!("ets: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = Config::load_with_overrides(cli.config_overrides())?;

    match resolve_invocation(cli.command, login_shell) {
        Invocation::Stdin => {
            let mut timestamper = config.timestamper()?;
            print_stdin(&mut timestamper, &config.delimiter)?;
            Ok(0)
        }
        Invocation::Command(argv) => {
            tracing::debug!(?argv, "running command on a pty");
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            Ok(runtime.block_on(run_command(&argv, &config))?)
        }
    }
}

/// Exit codes outside 0..=255 are truncated by the OS anyway; do it
/// explicitly so that e.g. -1 becomes 255.
fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(code as u8)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}
