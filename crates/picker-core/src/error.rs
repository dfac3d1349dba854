use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PickerError {
    #[error("could not find {}: please ensure it exists", .0.display())]
    NotFound(PathBuf),

    #[error("roster is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("pick order {0} is the largest possible; reset the roster to keep picking")]
    OrderOverflow(u32),

    #[error("failed to save roster to {}: {reason}", path.display())]
    SaveFailed { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, PickerError>;
