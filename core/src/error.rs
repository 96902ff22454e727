use std::fmt;

use http::Method;
use http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// The error type for alioss operations
#[derive(Error, Debug)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    method: Option<Method>,
    service: Option<Box<ServiceError>>,
    #[source]
    source: Option<anyhow::Error>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration error (missing fields, unparsable endpoint)
    ConfigInvalid,

    /// Credentials are missing or malformed
    CredentialInvalid,

    /// Request cannot be built or signed
    RequestInvalid,

    /// The connection ended before the response was complete
    UnexpectedEof,

    /// Host name resolution failed
    Dns,

    /// The connection could not be established
    Connect,

    /// Reading from the connection failed
    Read,

    /// Writing to the connection failed
    Write,

    /// The read deadline expired
    Timeout,

    /// The service answered with a non-success status
    Service,

    /// A success response could not be decoded
    Decode,

    /// Unexpected errors
    Unexpected,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            method: None,
            service: None,
            source: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Record the HTTP method of the request this error belongs to.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the HTTP method of the failed request, if known.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Get the structured service error, if the service sent one.
    pub fn service_error(&self) -> Option<&ServiceError> {
        self.service.as_deref()
    }

    /// HTTP status code reported by the service, if any.
    pub fn status_code(&self) -> Option<StatusCode> {
        self.service.as_ref().map(|e| e.status_code)
    }
}

// Convenience constructors
impl Error {
    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create a credential invalid error
    pub fn credential_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialInvalid, message)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Create a service error from the structured error document.
    pub fn service(err: ServiceError) -> Self {
        Self {
            kind: ErrorKind::Service,
            message: err.message.clone(),
            method: None,
            service: Some(Box::new(err)),
            source: None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::CredentialInvalid => write!(f, "invalid credentials"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::UnexpectedEof => write!(f, "unexpected end of stream"),
            ErrorKind::Dns => write!(f, "dns resolution failed"),
            ErrorKind::Connect => write!(f, "connect failed"),
            ErrorKind::Read => write!(f, "read failed"),
            ErrorKind::Write => write!(f, "write failed"),
            ErrorKind::Timeout => write!(f, "deadline exceeded"),
            ErrorKind::Service => write!(f, "service error"),
            ErrorKind::Decode => write!(f, "decode failed"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// ServiceError is the `<Error>` document OSS returns with a failed response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename = "Error", rename_all = "PascalCase", default)]
pub struct ServiceError {
    /// HTTP status code (200, 403, ...)
    #[serde(skip, default = "default_status")]
    pub status_code: StatusCode,
    /// OSS error code ("NoSuchKey", "AccessDenied", ...)
    pub code: String,
    /// The human-oriented error message
    pub message: String,
    /// Bucket involved in the failed request.
    pub bucket_name: String,
    /// Request id assigned by the service.
    pub request_id: String,
    /// Host that served the request.
    pub host_id: String,
}

fn default_status() -> StatusCode {
    StatusCode::OK
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(err: http::header::ToStrError) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<quick_xml::DeError> for Error {
    fn from(err: quick_xml::DeError) -> Self {
        Self::decode(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<quick_xml::SeError> for Error {
    fn from(err: quick_xml::SeError) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}
