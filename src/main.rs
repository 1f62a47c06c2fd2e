//! gateway-evidence CLI entry point
//!
//! Runs the Kong compliance checks and submits the evidence to Drata.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gateway_evidence::checks::{catalog, install_panic_hook};
use gateway_evidence::cli::args::{Args, Command};
use gateway_evidence::cli::output::{format_catalog, format_submissions, get_formatter, TerminalFormatter};
use gateway_evidence::config::Config;
use gateway_evidence::engine::orchestrator::CheckContext;
use gateway_evidence::gateway::{DataplaneClient, KonnectClient};
use gateway_evidence::sink::{build_sink, submit_all};
use gateway_evidence::version::get_build_info;
use gateway_evidence::{run_checks, HarnessError, RunOptions};

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);
    install_panic_hook();

    match args.command() {
        Command::List => {
            print!("{}", format_catalog(&catalog()));
            ExitCode::SUCCESS
        }
        Command::Run => match run(&args) {
            Ok(code) => ExitCode::from(code),
            Err(e) => {
                error!(error = %e, "run aborted");
                eprintln!("Error: {}", e);
                if matches!(e, HarnessError::Config(_)) {
                    eprintln!("Required variables: KONNECT_TOKEN, DATAPLANE_URL (and DRATA_API_KEY unless --dry-run)");
                }
                ExitCode::from(1)
            }
        },
    }
}

/// Log to stderr; `warn` by default, `info` with --verbose, RUST_LOG wins.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<u8, HarnessError> {
    let build = get_build_info();
    info!(version = build.version, commit = build.commit, "gateway-evidence starting");

    let config = Config::from_env()?.with_overrides(args.dry_run, args.verbose);

    // Chosen up front so a missing live credential stops the run before any check.
    let sink = build_sink(&config)?;

    let admin = KonnectClient::new(
        &config.kong.konnect_token,
        config.kong.konnect_api_base(),
        &config.kong.control_plane_name,
        config.request_timeout(),
    )?;
    let dataplane = DataplaneClient::new(&config.kong.dataplane_url, config.request_timeout())?;
    let context = CheckContext::new(Arc::new(admin), Arc::new(dataplane), &config);

    info!(mode = %sink.mode(), dataplane = %config.kong.dataplane_url, "starting compliance run");

    let progress = TerminalFormatter::new(args.color(), config.verbose, args.quiet);
    let report = run_checks(&context, &RunOptions::from_args(args), &mut |evidence| {
        if !args.quiet {
            eprintln!("{}", progress.progress_line(evidence));
        }
    });

    let formatter = get_formatter(args.format, args.color(), config.verbose, args.quiet);
    println!("{}", formatter.format(&report));

    if !sink.health_check() {
        warn!(mode = %sink.mode(), "evidence sink is unreachable, submissions will likely fail");
    }
    let submissions = submit_all(sink.as_ref(), &report.results);
    eprintln!("{}", format_submissions(&submissions));

    if let Some(path) = &args.output {
        report.write_export(path)?;
        eprintln!("Results written to {}", path.display());
    }

    Ok(report.summary().exit_code())
}
