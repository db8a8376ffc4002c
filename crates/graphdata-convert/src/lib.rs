//! Converts JavaScript data scripts into JSON files.
//!
//! Walks a directory tree, evaluates every `.js` file in a fresh, isolated
//! environment, and writes the value of its global `graphData` binding to a
//! sibling `.json` file. The output is pretty-printed with four-space
//! indentation and no trailing newline.
//!
//! # Example
//!
//! ```no_run
//! use graphdata_convert::{run, ConvertConfig, TracingReporter};
//!
//! let config = ConvertConfig::new("charts");
//! let summary = run(&config, &mut TracingReporter).unwrap();
//! println!("{} of {} scripts converted", summary.written, summary.scripts);
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod report;
pub mod walker;
pub mod writer;

pub use config::{ConvertConfig, DEFAULT_BINDING};
pub use error::{ExtractError, WalkError, WriteError};
pub use extractor::{extract, Extraction};
pub use pipeline::{run, RunSummary};
pub use report::{MemoryReporter, Reporter, TracingReporter};
pub use walker::find_scripts;
pub use writer::{output_path, write};
