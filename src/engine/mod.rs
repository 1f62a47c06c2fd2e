//! Evidence engine module.
//!
//! Provides check orchestration and evidence aggregation.

pub mod orchestrator;
pub mod result;
