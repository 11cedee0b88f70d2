//! Error types shared by every layer of the client.
//!
//! Transport and decoding failures travel through the same channel as successful results, so a
//! caller waiting on a call always receives exactly one `Result`.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, EchoError>;

/// Boxed cause carried by crypto failures
pub type ErrorSource = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum EchoError {
    /// Bad address, checksum, WIF, object id or other textual input
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Key derivation, signing or encryption failure
    #[error("crypto error: {context}")]
    Crypto {
        context: String,
        #[source]
        source: ErrorSource,
    },

    /// Memo checksum did not match the decrypted plaintext
    #[error("corrupted message")]
    CorruptedMessage,

    /// Socket failed or was disconnected
    #[error("connection error: {0}")]
    Connection(String),

    /// The node returned a structured error for a call
    #[error("call {call_id} failed: {message}")]
    Response { call_id: u64, message: String },

    /// Response payload did not have the expected shape
    #[error("decoding error: {0}")]
    Decoding(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A builder was finalized without a required field
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// Numeric value does not fit its wire representation
    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("call id {0} is already pending")]
    DuplicateCall(u64),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl EchoError {
    pub fn crypto<E>(context: impl Into<String>, source: E) -> Self
    where
        E: Into<ErrorSource>,
    {
        EchoError::Crypto {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn decoding(message: impl std::fmt::Display) -> Self {
        EchoError::Decoding(message.to_string())
    }
}

impl From<serde_json::Error> for EchoError {
    fn from(error: serde_json::Error) -> Self {
        EchoError::Decoding(error.to_string())
    }
}

impl From<secp256k1::Error> for EchoError {
    fn from(error: secp256k1::Error) -> Self {
        EchoError::crypto("secp256k1", error)
    }
}
