//! CLI error type.

use the_shop_client::{ActionError, ApiError, ConfigError};
use thiserror::Error;

/// Errors that end a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Environment configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be created.
    #[error("Client error: {0}")]
    Client(#[from] ApiError),

    /// An intent failed; shows the message meant for the user.
    #[error("{}", .0.user_message())]
    Action(#[from] ActionError),

    /// Writing output or reading input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
