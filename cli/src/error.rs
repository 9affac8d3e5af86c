use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Keys(#[from] kagi_keys::Error),

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("console error: {0}")]
    Console(#[from] std::io::Error),

    #[error("invalid base64 signature: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl Error {
    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        Error::Keys(kagi_keys::Error::Argument(msg.into()))
    }

    pub(crate) fn invalid_operation(msg: impl Into<String>) -> Self {
        Error::Keys(kagi_keys::Error::InvalidOperation(msg.into()))
    }

    pub(crate) fn cryptographic(msg: impl Into<String>) -> Self {
        Error::Keys(kagi_keys::Error::Cryptographic(msg.into()))
    }
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
