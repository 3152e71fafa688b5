use thiserror::Error;

/// Exit status reported for any failure of the bridge itself.
pub const BRIDGE_FAILURE_STATUS: i32 = 1;

/// Usage line printed on an argument-count error, with no prefix.
pub const USAGE: &str = "usage: breakbridge \"<command line>\"";

/// Path conversion failures. Any of these aborts environment translation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("cannot map absolute path '{path}' in {variable}: no root directory configured")]
    Unmapped { variable: String, path: String },

    #[error("value of {variable} is not valid unicode")]
    NotUnicode { variable: String },
}

/// Custom error types for breakbridge
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("usage: breakbridge \"<command line>\"")]
    Usage,

    #[error("failed to create process: {0}")]
    Spawn(String),

    #[error("environment translation failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("failed to install interrupt handler: {0}")]
    Signal(String),

    #[error("waiting for child failed: {0}")]
    Wait(String),
}

impl BridgeError {
    /// Every bridge failure is fatal and reported with the same status.
    pub fn exit_status(&self) -> i32 {
        BRIDGE_FAILURE_STATUS
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
