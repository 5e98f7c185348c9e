use shared::error::ErrorCode;
use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("server unreachable: {0}")]
    Offline(String),
    #[error("transport failure: {0}")]
    Network(String),
    #[error("malformed server response: {0}")]
    Decode(String),
    /// `status` is `None` when the service answered 2xx with
    /// `success: false`.
    #[error("server reported failure (status {status:?}): {}", .message.as_deref().unwrap_or("<no message>"))]
    Server {
        status: Option<u16>,
        message: Option<String>,
    },
    #[error("unrecognized role '{0}'")]
    UnknownRole(String),
    #[error("another operation is still in flight")]
    Busy,
    #[error("local storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

impl ClientError {
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_connect() {
            Self::Offline(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }

    pub(crate) fn rejected(message: Option<String>) -> Self {
        Self::Server {
            status: None,
            message,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) | Self::Busy => ErrorCode::Validation,
            Self::Offline(_) | Self::Network(_) | Self::Decode(_) | Self::Storage(_) => {
                ErrorCode::Network
            }
            Self::Server { .. } | Self::UnknownRole(_) => ErrorCode::Server,
        }
    }

    /// Message supplied by the service, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }
}
