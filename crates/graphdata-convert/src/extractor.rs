//! Reading a data script and pulling its binding out.

use std::fs;
use std::path::Path;

use graphdata_eval::{evaluate, Value};
use graphdata_types::SourceFile;
use tracing::debug;

use crate::config::ConvertConfig;
use crate::error::ExtractError;
use crate::report::Reporter;

/// What one script yielded.
///
/// `Present` holds whatever the binding held, including falsy values such
/// as `0`, `null`, `""`, and `undefined`.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Present(Value),
    Absent,
}

impl Extraction {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

/// Read and evaluate the script at `path` and return its
/// `config.binding` value.
///
/// Never fails: read errors, evaluation errors, and a missing binding are
/// reported and turned into [`Extraction::Absent`].
pub fn extract<R: Reporter + ?Sized>(
    path: &Path,
    config: &ConvertConfig,
    reporter: &mut R,
) -> Extraction {
    match load(path, config) {
        Ok(Some(value)) => Extraction::Present(value),
        Ok(None) => {
            reporter.warn(&format!("No {} found in {}", config.binding, path.display()));
            Extraction::Absent
        }
        Err(ExtractError::Read(err)) => {
            reporter.error(&format!("Error reading {}: {err}", path.display()));
            Extraction::Absent
        }
        Err(ExtractError::Eval(err)) => {
            reporter.error(&format!("Error evaluating {}: {}", path.display(), err.brief()));
            Extraction::Absent
        }
    }
}

fn load(path: &Path, config: &ConvertConfig) -> Result<Option<Value>, ExtractError> {
    let text = fs::read_to_string(path)?;
    let source = SourceFile::new(path.display().to_string(), text);
    let env = evaluate(&source, config.gas_limit)?;
    debug!(path = %path.display(), bindings = env.names().count(), "evaluated script");
    Ok(env.into_value(&config.binding))
}
