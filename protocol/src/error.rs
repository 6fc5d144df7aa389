//! Error types for the Nagad checkout protocol.
//!
//! Every fallible operation in this crate returns a [`NagadError`]. The
//! variants map one-to-one onto the places a payment can go wrong: bad key
//! material, a crypto primitive refusing the input, the gateway saying no,
//! or the network falling over.

use thiserror::Error;

/// Errors that can occur while talking to the Nagad gateway.
#[derive(Debug, Error)]
pub enum NagadError {
    /// Key material could not be read or is not a valid RSA key in PEM form.
    #[error("invalid key material: {0}")]
    KeyFormat(String),

    /// RSA encryption or signing failed (usually: plaintext too large).
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// RSA decryption failed: corrupt ciphertext, bad base64 or wrong key.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// The gateway answered with something that breaks the protocol
    /// contract: missing fields, undecryptable or non-JSON sensitive data.
    #[error("malformed gateway response: {0}")]
    MalformedResponse(String),

    /// The gateway explicitly rejected the request. `reason` is the
    /// gateway's machine-readable code; branch on it, not on `message`.
    #[error(
        "gateway rejected the request: {message} (reason: {})",
        .reason.as_deref().unwrap_or("unspecified")
    )]
    Gateway {
        /// Human-readable message from the gateway.
        message: String,
        /// Machine-readable rejection code, when the gateway sent one.
        reason: Option<String>,
    },

    /// Network failure, timeout, or a response body that isn't JSON.
    #[error("transport error: {0}")]
    Transport(String),

    /// The construction config is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The payment request failed validation; nothing was sent.
    #[error("invalid payment request: {0}")]
    InvalidRequest(String),

    /// An outbound record could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl NagadError {
    /// The gateway's rejection code, if this is a [`NagadError::Gateway`].
    pub fn reason(&self) -> Option<&str> {
        match self {
            NagadError::Gateway { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }

    /// True when the gateway itself said no, as opposed to a local failure.
    pub fn is_gateway_rejection(&self) -> bool {
        matches!(self, NagadError::Gateway { .. })
    }
}
