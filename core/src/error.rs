use thiserror::Error;

/// Errors produced when turning a pasted link into a video identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The link is not URL-like or carries no single, non-empty `v` parameter
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
}

/// Errors raised on either side of the embedded player bridge
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// No embedded page is mounted, so there is nothing to talk to
    #[error("No embedded player is mounted")]
    NotMounted,

    /// The payload was not a well-formed bridge message
    #[error("Malformed bridge message: {0}")]
    Decode(String),

    /// Well-formed message with a `type` tag the host does not know
    #[error("Unknown bridge message kind: {0}")]
    UnknownKind(String),

    /// `stateChange` carried a code outside the player state table
    #[error("Unknown player state code: {0}")]
    UnknownState(i64),

    /// The host transport failed (socket, server thread, ...)
    #[error("Bridge transport error: {0}")]
    Transport(String),
}

impl From<serde_json::Error> for BridgeError {
    fn from(error: serde_json::Error) -> Self {
        BridgeError::Decode(error.to_string())
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(error: std::io::Error) -> Self {
        BridgeError::Transport(error.to_string())
    }
}

/// Errors raised while loading the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
}
