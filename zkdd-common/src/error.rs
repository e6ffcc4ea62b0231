//! Error types for the note, hex and proof codecs.

use thiserror::Error;

/// Errors raised while encoding or decoding client-side artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A note must be exactly 62 bytes.
    #[error("invalid note length: expected {expected} bytes, got {actual}")]
    InvalidNoteLength { expected: usize, actual: usize },

    /// A value does not fit in the requested width.
    #[error("value needs {needed} bytes but the target width is {width}")]
    ValueTooWide { needed: usize, width: usize },

    /// Hex input could not be decoded.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Bytes or digits do not describe a canonical field element.
    #[error("invalid field element: {0}")]
    InvalidFieldElement(String),

    /// Address strings must hold exactly 20 bytes.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Snarkjs proof JSON did not have the expected shape.
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// Packed encrypted message shorter than nonce and ephemeral key.
    #[error("packed message too short: {0} bytes")]
    MessageTooShort(usize),

    /// Base64 field in an encrypted message could not be decoded.
    #[error("invalid base64 in {field}: {reason}")]
    InvalidBase64 { field: &'static str, reason: String },

    /// The Poseidon hasher rejected its inputs.
    #[error("poseidon hash failed: {0}")]
    Hash(String),

    /// Commitment or nullifier derivation does not match the witness.
    #[error("witness mismatch: {0}")]
    WitnessMismatch(&'static str),
}

pub type Result<T> = std::result::Result<T, CodecError>;
