//! Filter error types

use std::path::PathBuf;
use thiserror::Error;

use crate::ListKind;

/// Domain list errors
#[derive(Debug, Error)]
pub enum FilterError {
    /// Backing file could not be read
    #[error("failed to read {list} list from '{path}': {source}")]
    Read {
        list: ListKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reload requested for a list without a backing file
    #[error("no backing file configured for {0} list")]
    NoSource(ListKind),
}
