use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LockwhoError {
    #[error("Platform error: {0}")]
    Platform(String),
    #[error("Cannot access {}: {source}", .path.display())]
    TargetAccess {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, LockwhoError>;
