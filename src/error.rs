//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.
//! Every failure crossing the provider boundary is classified into one of
//! these variants; user-facing text comes from [`Error::user_message`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("malformed image data: {0}")]
    MalformedImage(String),

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("provider response contained no candidates")]
    EmptyResponse,

    #[error("provider response contained no image data")]
    NoImageReturned,

    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Sub-classification of a non-2xx provider response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpFailureKind {
    Auth,
    Quota,
    Other,
}

impl Error {
    /// Classifies an [`Error::HttpStatus`] by its status code and body text.
    ///
    /// Returns `None` for every other variant.
    pub fn http_failure_kind(&self) -> Option<HttpFailureKind> {
        let Error::HttpStatus { status, body } = self else {
            return None;
        };

        Some(match status {
            401 | 403 => HttpFailureKind::Auth,
            429 => HttpFailureKind::Quota,
            _ if body.to_ascii_lowercase().contains("quota") => HttpFailureKind::Quota,
            _ => HttpFailureKind::Other,
        })
    }

    /// Message suitable for display to the user.
    ///
    /// Raw status codes and response bodies stay in the `Display` output for
    /// logs; they are never included here.
    pub fn user_message(&self) -> String {
        match self {
            Error::Configuration(message) => message.clone(),
            Error::MalformedImage(_) => "Image processing failed. Please try again.".to_string(),
            Error::Transport(_) => {
                "Could not reach the image service. Check your connection.".to_string()
            }
            Error::HttpStatus { .. } => match self.http_failure_kind() {
                Some(HttpFailureKind::Auth) => {
                    "The image service rejected the configured API key.".to_string()
                }
                Some(HttpFailureKind::Quota) => {
                    "The image service quota has been used up. Try again later.".to_string()
                }
                _ => "The image service returned an error. Try again later.".to_string(),
            },
            Error::EmptyResponse | Error::NoImageReturned | Error::InvalidResponse(_) => {
                "Generation failed. Try again.".to_string()
            }
            Error::Io(_) | Error::Serialization(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
