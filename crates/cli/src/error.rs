//! CLI errors and their exit codes.
//!
//! | code | meaning |
//! |------|---------|
//! | 0    | success |
//! | 2    | clap argument error, raised before `run` |
//! | 10   | effect error: unknown effect, bad config, bad dimensions |
//! | 11   | I/O error while writing the snapshot |
//! | 12   | input error: bad `--params` JSON, bad `--background` |
//! | 13   | serialization error in `--json` output |

use skyfx_core::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Effect(EngineError),
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Serialization(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Effect(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Io(msg) => CliError::Io(msg),
            other => CliError::Effect(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
