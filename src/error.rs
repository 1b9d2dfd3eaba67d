//! failure taxonomy for a single connection
//!
//! [`PipelineError`] covers everything that still gets an http response;
//! [`TransportError`] covers the connection itself failing, after which
//! nothing more is written.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::http::{RequestError, Response, Status};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed request: {0}")]
    Malformed(#[from] RequestError),

    #[error("no route for '{uri}'")]
    Unroutable { uri: String },

    #[error("nothing is served at /")]
    RootNotServed,

    #[error("'{path}' is not a file")]
    NotFound { path: String },

    #[error("'{path}' leaves the public directory")]
    Forbidden { path: String },

    #[error("no handler registered for tag '{tag}'")]
    UnsupportedHandler { tag: String },

    #[error("request header block exceeds {limit} bytes")]
    RequestTooLarge { limit: usize },

    #[error("no complete request within {0:?}")]
    RequestTimeout(Duration),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub fn status(&self) -> Status {
        match self {
            PipelineError::Malformed(_) | PipelineError::Unroutable { .. } => Status::BAD_REQUEST,
            PipelineError::RootNotServed | PipelineError::NotFound { .. } => Status::NOT_FOUND,
            PipelineError::Forbidden { .. } => Status::FORBIDDEN,
            PipelineError::RequestTooLarge { .. } => Status::HEADER_FIELDS_TOO_LARGE,
            PipelineError::RequestTimeout(_) => Status::REQUEST_TIMEOUT,
            PipelineError::UnsupportedHandler { .. } | PipelineError::Io { .. } => {
                Status::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// the response sent in place of a handler's. the body carries only the
    /// reason phrase so filesystem paths never reach the client.
    pub fn to_response(&self) -> Response {
        let status = self.status();
        Response::text(status, status.reason)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer closed the connection after {received} bytes, before the request was complete")]
    ClosedEarly { received: usize },

    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    #[error("drain failed: {0}")]
    Drain(#[source] io::Error),

    #[error("drain did not complete within {0:?}")]
    DrainTimeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (PipelineError::Malformed(RequestError::LeadingSpace), 400),
            (
                PipelineError::Unroutable {
                    uri: "/x".to_string(),
                },
                400,
            ),
            (PipelineError::RootNotServed, 404),
            (
                PipelineError::NotFound {
                    path: "/srv/public/x".to_string(),
                },
                404,
            ),
            (
                PipelineError::Forbidden {
                    path: "/../x".to_string(),
                },
                403,
            ),
            (
                PipelineError::UnsupportedHandler {
                    tag: "proxy_dir".to_string(),
                },
                500,
            ),
            (PipelineError::RequestTooLarge { limit: 10 }, 431),
            (PipelineError::RequestTimeout(Duration::from_secs(1)), 408),
        ];

        for (err, code) in cases {
            assert_eq!(err.status().code, code, "{}", err);
        }
    }

    #[test]
    fn test_error_response_is_well_formed() {
        let err = PipelineError::NotFound {
            path: "/srv/secret/public/x".to_string(),
        };
        let response = err.to_response();
        let bytes = response.to_bytes();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Content-Length: 10\r\n"));
        assert!(text.ends_with("\r\n\r\nNot Found\n"));
        assert!(!text.contains("/srv/secret"));
    }

    #[test]
    fn test_malformed_message_names_rule() {
        let err = PipelineError::from(RequestError::UnsupportedMethod("PUT".to_string()));
        assert_eq!(err.to_string(), "malformed request: unsupported method 'PUT'");
    }
}
