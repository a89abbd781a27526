use std::fmt;

use crate::payload::Payload;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("The request URL is mandatory.")]
    MissingUrl,

    #[error("The context's origin is mandatory.")]
    MissingOrigin,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },

    #[error("Invalid HTTP method: {method}")]
    InvalidMethod { method: String },

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The transport failed before a status code was available.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The remote answered with a failure status.
    #[error(transparent)]
    Status(#[from] RequestError),
}

impl Error {
    /// True for errors raised while resolving the request, before any I/O.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Error::Http(_) | Error::Status(_))
    }

    /// Status code of a failure response, if the remote answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Status(e) => Some(e.status_code),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Decoded body of a failure response.
    pub fn body(&self) -> Option<&Payload> {
        match self {
            Error::Status(e) => Some(&e.body),
            _ => None,
        }
    }
}

/// A response whose status code is in the failure range.
///
/// The body has already been drained and run through [`try_parse`](crate::try_parse).
#[derive(Debug, Clone, PartialEq)]
pub struct RequestError {
    pub message: String,
    pub status_code: u16,
    pub body: Payload,
}

impl RequestError {
    pub fn new(status_code: u16, body: Payload) -> Self {
        Self {
            message: format!("Request failed with status code {}.", status_code),
            status_code,
            body,
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RequestError {}
