//! Preflight command - validates host tools and component payloads.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::preflight::run_preflight;

/// Execute the preflight command.
pub fn cmd_preflight(config: &Config) -> Result<()> {
    println!("Preflight checks:");
    let report = run_preflight(config);
    report.print();

    if !report.passed() {
        bail!("Preflight failed. Fix the items above before building.");
    }
    println!("All checks passed.");
    Ok(())
}
