use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use deck_tally_core::TallyState;
use thiserror::Error;

use crate::{DecodeError, PersistenceCodec};

const TRANSFER_DOMAIN: &str = "tally";
const TRANSFER_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded transfer payload.
pub const TRANSFER_HEADER: &str = "tally:v1";
/// Delimiter used to separate the prefix, version and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes the state into a single-line string suitable for clipboard transfer.
#[must_use]
pub fn encode_transfer(codec: &PersistenceCodec, state: &TallyState) -> String {
    let encoded = STANDARD_NO_PAD.encode(codec.encode(state));
    format!("{TRANSFER_HEADER}{FIELD_DELIMITER}{encoded}")
}

/// Decodes a transfer string, validating the embedded payload like a stored one.
pub fn decode_transfer(codec: &PersistenceCodec, value: &str) -> Result<TallyState, TransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TransferError::EmptyPayload);
    }

    let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
    let domain = parts.next().ok_or(TransferError::MissingPrefix)?;
    let version = parts.next().ok_or(TransferError::MissingVersion)?;
    let payload = parts.next().ok_or(TransferError::MissingPayload)?;

    if domain != TRANSFER_DOMAIN {
        return Err(TransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != TRANSFER_VERSION {
        return Err(TransferError::UnsupportedVersion(version.to_owned()));
    }

    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(TransferError::InvalidEncoding)?;
    let json = String::from_utf8(bytes).map_err(TransferError::InvalidText)?;
    codec
        .try_decode(&json)
        .map_err(TransferError::InvalidPayload)
}

/// Errors that can occur while decoding transfer strings.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("transfer string was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("transfer string is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("transfer string is missing the version")]
    MissingVersion,
    /// The payload segment was missing.
    #[error("transfer string is missing the payload")]
    MissingPayload,
    /// The prefix segment was not recognised.
    #[error("transfer prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The version segment was not recognised.
    #[error("transfer version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode transfer payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload was not UTF-8.
    #[error("transfer payload is not valid text: {0}")]
    InvalidText(#[source] std::string::FromUtf8Error),
    /// The embedded state failed validation.
    #[error("transfer payload was rejected: {0}")]
    InvalidPayload(#[source] DecodeError),
}
