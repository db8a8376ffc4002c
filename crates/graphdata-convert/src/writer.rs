//! Writing extracted values next to their scripts.

use std::fs;
use std::path::{Path, PathBuf};

use graphdata_eval::{to_pretty_json, Value};

use crate::config::ConvertConfig;
use crate::error::WriteError;
use crate::report::Reporter;

/// The output path for `source`: the first `.js` in the whole path string
/// becomes `.json`.
///
/// This is a plain substring replacement, so a directory such as `js.js`
/// earlier in the path takes the replacement instead of the file name.
pub fn output_path(source: &Path, config: &ConvertConfig) -> Result<PathBuf, WriteError> {
    let text = source.to_str().ok_or_else(|| WriteError::NonUtf8Path {
        path: source.to_path_buf(),
    })?;
    let from = format!(".{}", config.script_extension);
    let to = format!(".{}", config.output_extension);
    Ok(PathBuf::from(text.replacen(&from, &to, 1)))
}

/// Serialize `value` and write it to the output path for `source`.
///
/// Reports the outcome and returns the written path, or `None` if the write
/// failed.
pub fn write<R: Reporter + ?Sized>(
    source: &Path,
    value: &Value,
    config: &ConvertConfig,
    reporter: &mut R,
) -> Option<PathBuf> {
    let target = match output_path(source, config) {
        Ok(target) => target,
        Err(err) => {
            reporter.error(&format!("Error saving {}: {err}", source.display()));
            return None;
        }
    };
    match save(&target, value) {
        Ok(()) => {
            reporter.info(&format!("Successfully saved {}", target.display()));
            Some(target)
        }
        Err(err) => {
            reporter.error(&format!("Error saving {}: {err}", target.display()));
            None
        }
    }
}

fn save(target: &Path, value: &Value) -> Result<(), WriteError> {
    let json = to_pretty_json(value)?;
    fs::write(target, json)?;
    Ok(())
}
