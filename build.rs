//! Build script for gateway-evidence.
//!
//! Records version information from git and the toolchain. Every variable is
//! always set so the crate can read them with `env!`; unavailable values are
//! reported as "unknown".

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=GATEWAY_EVIDENCE_TARGET={}", target);

    println!(
        "cargo:rustc-env=GATEWAY_EVIDENCE_GIT_HASH={}",
        get_git_hash().unwrap_or_else(unknown)
    );
    println!(
        "cargo:rustc-env=GATEWAY_EVIDENCE_BUILD_DATE={}",
        get_build_date().unwrap_or_else(unknown)
    );
    println!(
        "cargo:rustc-env=GATEWAY_EVIDENCE_RUSTC_VERSION={}",
        get_rustc_version().unwrap_or_else(unknown)
    );
}

fn unknown() -> String {
    "unknown".to_string()
}

/// Run a command and return its trimmed stdout on success
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Get the current git commit hash (short form)
fn get_git_hash() -> Option<String> {
    command_output("git", &["rev-parse", "--short", "HEAD"])
}

/// Get the current build date in ISO 8601 format
fn get_build_date() -> Option<String> {
    command_output("date", &["-u", "+%Y-%m-%dT%H:%M:%SZ"])
}

/// Get the rustc version
fn get_rustc_version() -> Option<String> {
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    // "rustc 1.75.0 (..." -> "1.75.0"
    command_output(&rustc, &["--version"])
        .and_then(|s| s.split_whitespace().nth(1).map(|v| v.to_string()))
}
