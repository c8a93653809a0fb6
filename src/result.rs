use std::path::PathBuf;

use compact_str::CompactString;
use confy::ConfyError;
use thiserror::Error;

use crate::client::ClientError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failure reading configuration file {}.", path.display())]
    ConfigError {
        path: PathBuf,
        #[source]
        source: ConfyError,
    },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Failed to initialize logging: {0}")]
    LoggingError(CompactString),

    #[error("{0}")]
    GeneralError(CompactString),
}
