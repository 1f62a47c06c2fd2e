//! Version and build information.
//!
//! Provides version, git commit, and build metadata.

use std::fmt;

/// Text shown by `--version` in long form.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nCommit: ",
    env!("GATEWAY_EVIDENCE_GIT_HASH"),
    "\nBuilt: ",
    env!("GATEWAY_EVIDENCE_BUILD_DATE"),
    "\nTarget: ",
    env!("GATEWAY_EVIDENCE_TARGET"),
    "\nRustc: ",
    env!("GATEWAY_EVIDENCE_RUSTC_VERSION"),
);

/// Build information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub build_date: &'static str,
    pub target: &'static str,
    pub rustc_version: &'static str,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "gateway-evidence {}", self.version)?;
        writeln!(f, "Commit: {}", self.commit)?;
        writeln!(f, "Built: {}", self.build_date)?;
        writeln!(f, "Target: {}", self.target)?;
        write!(f, "Rustc: {}", self.rustc_version)
    }
}

/// Get build information
pub fn get_build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        commit: env!("GATEWAY_EVIDENCE_GIT_HASH"),
        build_date: env!("GATEWAY_EVIDENCE_BUILD_DATE"),
        target: env!("GATEWAY_EVIDENCE_TARGET"),
        rustc_version: env!("GATEWAY_EVIDENCE_RUSTC_VERSION"),
    }
}
