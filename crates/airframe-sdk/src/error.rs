use airframe_crypto::SignatureError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("object not found: {typ}/{id}")]
    NotFound { typ: String, id: String },

    #[error("not authorized to update {typ}/{id}")]
    NotAuthorized { typ: String, id: String },

    /// Any other non-success response, with the server's error message.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("signing failed: {0}")]
    Signature(#[from] SignatureError),

    #[error("invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
