//! One full conversion run: scan, extract, write.

use tracing::debug;

use crate::config::ConvertConfig;
use crate::error::WalkError;
use crate::extractor::{extract, Extraction};
use crate::report::Reporter;
use crate::walker::find_scripts;
use crate::writer::write;

/// Counts gathered over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Scripts found by the scan.
    pub scripts: usize,
    /// Output files written.
    pub written: usize,
    /// Scripts that could not be read or evaluated, or lacked the binding.
    pub absent: usize,
    /// Extracted values whose output could not be saved.
    pub failed_writes: usize,
}

/// Convert every script below `config.root`.
///
/// Per-file problems are reported and the run moves on. Only a failed scan
/// aborts, in which case nothing has been written.
pub fn run<R: Reporter + ?Sized>(
    config: &ConvertConfig,
    reporter: &mut R,
) -> Result<RunSummary, WalkError> {
    let scripts = find_scripts(config, reporter)?;
    debug!(root = %config.root.display(), count = scripts.len(), "scan finished");

    let mut summary = RunSummary {
        scripts: scripts.len(),
        ..RunSummary::default()
    };
    for script in &scripts {
        match extract(script, config, reporter) {
            Extraction::Present(value) => {
                if write(script, &value, config, reporter).is_some() {
                    summary.written += 1;
                } else {
                    summary.failed_writes += 1;
                }
            }
            Extraction::Absent => summary.absent += 1,
        }
    }

    reporter.info(&format!(
        "Processing complete: {} scripts, {} written, {} without {}, {} failed to save",
        summary.scripts, summary.written, summary.absent, config.binding, summary.failed_writes
    ));
    Ok(summary)
}
