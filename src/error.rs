use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors that abort a run, or that a caller has to look at explicitly.
/// Unparsable endpoints are not errors, those sections get skipped.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ConfigParse(String),

    #[error("missing section [{0}]")]
    MissingSection(String),

    #[error("missing option '{key}' in section [{section}]")]
    MissingKey { section: String, key: String },

    #[error("failed to write config file {}: {source}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to set up logging: {0}")]
    Logging(String),
}
