//! Attachment migrator entry point.

use attmig::cli::commands;
use attmig::cli::{Cli, Commands};
use attmig::error::Error;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    init_tracing(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                eprintln!("{}", e.to_structured_json());
            } else {
                report(&e);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

/// Print an error for humans, including the remote body when there is one.
fn report(e: &Error) {
    eprintln!("Error: {e}");
    if let Some(body) = e.remote_body().filter(|b| !b.is_empty()) {
        eprintln!("  Response: {body}");
    }
    if let Some(hint) = e.hint() {
        eprintln!("  Hint: {hint}");
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("info,reqwest=warn,hyper=warn"),
            1 => EnvFilter::new("debug,hyper=info,rustls=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<(), Error> {
    match &cli.command {
        None | Some(Commands::Migrate) => {
            commands::migrate::execute(cli.config.as_ref(), cli.keep_staging, cli.json)
        }
        Some(Commands::Validate { offline }) => {
            commands::validate::execute(cli.config.as_ref(), *offline, cli.json)
        }
        Some(Commands::Version) => commands::version::execute(cli.json),
        Some(Commands::Completions { shell }) => commands::completions::execute(*shell),
    }
}
