//! Pipeline error types.

use std::io;
use std::path::PathBuf;

use graphdata_eval::{EvalError, JsonError};
use thiserror::Error;

/// The scan could not enumerate the tree. Aborts the run.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("cannot read directory {}: {source}", .path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a directory", .path.display())]
    NotADirectory { path: PathBuf },
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

/// One script could not be read or evaluated.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Read(#[from] io::Error),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// One output file could not be written.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("path {} is not valid UTF-8", .path.display())]
    NonUtf8Path { path: PathBuf },
    #[error(transparent)]
    Json(#[from] JsonError),
    #[error(transparent)]
    Io(#[from] io::Error),
}
