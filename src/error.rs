use thiserror::Error;

use crate::platform::PlatformError;

#[derive(Debug, Error)]
pub enum IgniteError {
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("No authenticated session")]
    NotAuthenticated,

    #[error("Invalid linking configuration: {0}")]
    InvalidLinking(String),
}

pub type Result<T> = std::result::Result<T, IgniteError>;
