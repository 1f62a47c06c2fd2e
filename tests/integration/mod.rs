//! Integration tests for gateway-evidence.
//!
//! These tests drive the checks, orchestration, output, and HTTP clients
//! against mock gateways and local HTTP servers.

pub mod cli_tests;
pub mod full_run_tests;
