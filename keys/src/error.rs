use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Unsupported algorithm, curve, cipher or size; a required input is missing.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// The operation makes no sense for the given keys or formats.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A signature or key pair failed verification.
    #[error("cryptographic check failed: {0}")]
    Cryptographic(String),

    /// Wrong password or a structurally invalid encrypted container.
    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("DER error: {0}")]
    Der(#[from] kagi_der::Error),

    #[error("PEM error: {0}")]
    Pem(#[from] kagi_pem::error::Error),

    #[error("SSH error: {0}")]
    Ssh(#[from] kagi_ssh::Error),

    #[error("PKCS#8 error: {0}")]
    Pkcs8(#[from] pkcs8::Error),

    #[error("SubjectPublicKeyInfo error: {0}")]
    Spki(#[from] pkcs8::spki::Error),

    #[error("RSA error: {0}")]
    Rsa(#[from] rsa::Error),

    #[error("elliptic curve error: {0}")]
    EllipticCurve(#[from] p256::elliptic_curve::Error),

    #[error("signature error: {0}")]
    Signature(#[from] rsa::signature::Error),
}

impl Error {
    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        Error::Argument(msg.into())
    }

    pub(crate) fn invalid_operation(msg: impl Into<String>) -> Self {
        Error::InvalidOperation(msg.into())
    }
}
