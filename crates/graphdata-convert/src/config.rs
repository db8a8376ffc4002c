//! Run configuration.

use std::path::PathBuf;

use graphdata_eval::DEFAULT_GAS_LIMIT;

/// The global binding a data script is expected to define.
pub const DEFAULT_BINDING: &str = "graphData";

/// Settings for one conversion run.
///
/// The binary only chooses `root`; everything else keeps its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    /// Directory the scan starts from.
    pub root: PathBuf,
    /// Name of the binding read out of each evaluated script.
    pub binding: String,
    /// Extension of the scripts to convert, without the dot.
    pub script_extension: String,
    /// Extension substituted into the output path, without the dot.
    pub output_extension: String,
    /// Evaluation steps allowed per script.
    pub gas_limit: u64,
    /// Follow symbolic links while walking. Link cycles are skipped.
    pub follow_links: bool,
}

impl ConvertConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            binding: DEFAULT_BINDING.to_string(),
            script_extension: "js".to_string(),
            output_extension: "json".to_string(),
            gas_limit: DEFAULT_GAS_LIMIT,
            follow_links: false,
        }
    }
}
