use base64::DecodeError;
use thiserror::Error;

/// Errors that can occur when parsing or decoding armored text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Missing the opening boundary marker (e.g., `-----BEGIN PUBLIC KEY-----`)
    #[error("missing a pre encapsulation boundary")]
    MissingPreEncapsulationBoundary,

    #[error("missing a post encapsulation boundary")]
    MissingPostEncapsulationBoundary,

    /// No data found between boundary markers
    #[error("missing PEM data")]
    MissingData,

    /// The label in the boundary marker is not one kagi reads or writes
    #[error("invalid label: {0}")]
    InvalidLabel(String),

    /// BEGIN and END labels differ
    #[error("label doesn't match")]
    LabelMissMatch,

    #[error("invalid base64line")]
    InvalidBase64Line,

    #[error("base64 decode: {0}")]
    Base64Decode(DecodeError),
}
