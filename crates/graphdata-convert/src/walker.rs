//! Recursive discovery of data scripts.

use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;

use tracing::debug;
use walkdir::WalkDir;

use crate::config::ConvertConfig;
use crate::error::WalkError;
use crate::report::Reporter;

/// Every regular file below `config.root` whose extension is exactly
/// `config.script_extension`, at any depth, in file-name order.
///
/// Fails if the root is missing, is not a directory, or any directory below
/// it cannot be listed. Symbolic links are neither followed nor returned
/// unless `config.follow_links` is set; a followed link that loops back to
/// an ancestor is reported and skipped.
pub fn find_scripts<R: Reporter + ?Sized>(
    config: &ConvertConfig,
    reporter: &mut R,
) -> Result<Vec<PathBuf>, WalkError> {
    let root = &config.root;
    let metadata = fs::metadata(root).map_err(|source| WalkError::Root {
        path: root.clone(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(WalkError::NotADirectory { path: root.clone() });
    }

    let extension = OsStr::new(&config.script_extension);
    let walker = WalkDir::new(root)
        .follow_links(config.follow_links)
        .sort_by_file_name();

    let mut scripts = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.loop_ancestor().is_some() => {
                let at = err.path().map(|p| p.display().to_string()).unwrap_or_default();
                reporter.warn(&format!("Skipping symbolic link loop at {at}"));
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        if entry.file_type().is_file() && entry.path().extension() == Some(extension) {
            debug!(path = %entry.path().display(), "found script");
            scripts.push(entry.into_path());
        }
    }
    Ok(scripts)
}
