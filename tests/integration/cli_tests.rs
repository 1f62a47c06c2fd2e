//! CLI integration tests.
//!
//! Tests for argument parsing and the mapping from arguments to run options.

use clap::error::ErrorKind;
use clap::Parser;

use gateway_evidence::cli::args::{Args, CategoryFilter, Command, OutputFormat};
use gateway_evidence::{CheckCategory, RunOptions};

fn parse(args: &[&str]) -> Result<Args, clap::Error> {
    Args::try_parse_from(std::iter::once("gateway-evidence").chain(args.iter().copied()))
}

#[test]
fn test_default_args() {
    let args = parse(&[]).unwrap();
    assert_eq!(args.command(), Command::Run);
    assert_eq!(args.category, CategoryFilter::All);
    assert_eq!(args.format, OutputFormat::Text);
    assert!(!args.dry_run);
    assert!(!args.quiet);
    assert!(!args.verbose);
    assert!(args.only.is_empty());
    assert!(args.skip.is_empty());
}

#[test]
fn test_run_command() {
    assert_eq!(parse(&["run"]).unwrap().command(), Command::Run);
}

#[test]
fn test_list_command() {
    assert_eq!(parse(&["list"]).unwrap().command(), Command::List);
}

#[test]
fn test_dry_run_flag() {
    assert!(parse(&["--dry-run"]).unwrap().dry_run);
    assert!(parse(&["run", "--dry-run"]).unwrap().dry_run);
}

#[test]
fn test_output_option() {
    let args = parse(&["--output", "evidence.json"]).unwrap();
    assert_eq!(args.output.unwrap().to_str(), Some("evidence.json"));

    let args = parse(&["-o", "out/evidence.json"]).unwrap();
    assert_eq!(args.output.unwrap().to_str(), Some("out/evidence.json"));
}

#[test]
fn test_format_equals_syntax() {
    assert_eq!(parse(&["--format=json"]).unwrap().format, OutputFormat::Json);
    assert_eq!(parse(&["--format=junit"]).unwrap().format, OutputFormat::Junit);
}

#[test]
fn test_category_option() {
    assert_eq!(parse(&["--category", "runtime"]).unwrap().category, CategoryFilter::Runtime);
    assert_eq!(
        parse(&["--category=configuration"]).unwrap().category,
        CategoryFilter::Configuration
    );
}

#[test]
fn test_no_color_flag() {
    let args = parse(&["--no-color"]).unwrap();
    assert!(args.no_color);
    assert!(!args.color());
}

#[test]
fn test_combined_flags() {
    let args = parse(&[
        "run",
        "--dry-run",
        "-v",
        "--format",
        "json",
        "--skip",
        "RT-001",
        "--skip",
        "RT-002",
        "-o",
        "report.json",
    ])
    .unwrap();

    assert!(args.dry_run);
    assert!(args.verbose);
    assert_eq!(args.format, OutputFormat::Json);
    assert_eq!(args.skip, ["RT-001", "RT-002"]);
    assert!(args.output.is_some());
}

#[test]
fn test_run_options_from_args() {
    let args = parse(&["--category", "configuration", "--only", "CF-001", "--skip", "CF-002"]).unwrap();
    let options = RunOptions::from_args(&args);

    assert_eq!(options.category, Some(CheckCategory::Configuration));
    assert_eq!(options.only_checks, ["CF-001"]);
    assert_eq!(options.skip_checks, ["CF-002"]);
    assert!(options.selects("cf-001", CheckCategory::Configuration));
    assert!(!options.selects("CF-002", CheckCategory::Configuration));
}

#[test]
fn test_default_run_options_select_all() {
    let options = RunOptions::from_args(&parse(&[]).unwrap());
    assert_eq!(options, RunOptions::default());
}

#[test]
fn test_help_flag() {
    let err = parse(&["--help"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayHelp);
}

#[test]
fn test_version_flag() {
    let err = parse(&["--version"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
}

#[test]
fn test_unknown_option_error() {
    let err = parse(&["--unknown"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownArgument);
}

#[test]
fn test_invalid_format_error() {
    let err = parse(&["--format", "yaml"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

#[test]
fn test_invalid_category_error() {
    assert!(parse(&["--category", "hardware"]).is_err());
}

#[test]
fn test_missing_skip_value_error() {
    assert!(parse(&["--skip"]).is_err());
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    let err = parse(&["--quiet", "--verbose"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
}

#[test]
fn test_unknown_subcommand_error() {
    assert!(parse(&["submit"]).is_err());
}
