// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::fmt;

use chrono::{DateTime, Utc};
use http::StatusCode;
use thiserror::Error;

/// The error type for fsapi operations
#[derive(Error, Debug)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    api: Option<Box<ApiError>>,
    attempts: Option<u32>,
    #[source]
    source: Option<anyhow::Error>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The API understood the request and rejected it.
    ///
    /// The rejection details are available via [`Error::api_error`].
    ApiRejected,

    /// The API kept answering `429 Too Many Requests` until the retry
    /// budget was spent.
    RateLimited,

    /// Request cannot be built (invalid method, uri, headers, etc.)
    RequestInvalid,

    /// Configuration error (missing fields, invalid values)
    ConfigInvalid,

    /// Unexpected errors (network, timeout, malformed response, etc.)
    Unexpected,
}

/// ApiError is the rejection payload returned by the remote service.
///
/// Every field is optional on the wire, missing fields are filled with
/// defaults while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// `error.type`, empty if absent.
    pub error_type: String,
    /// `error.message`, [`ApiError::DEFAULT_MESSAGE`] if absent.
    pub message: String,
    /// `error.code` as sent by the server.
    pub code: ApiErrorCode,
    /// `error.timestamp`, or the time the response was decoded.
    pub timestamp: DateTime<Utc>,
}

impl ApiError {
    /// Message used when the server doesn't send one.
    pub const DEFAULT_MESSAGE: &'static str = "Unknown error";
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "api error ({}): {}", self.status.as_u16(), self.message)?;
        if !self.error_type.is_empty() {
            write!(f, " [type: {}]", self.error_type)?;
        }
        if self.code != ApiErrorCode::Unknown {
            write!(f, " [code: {}]", self.code)?;
        }
        Ok(())
    }
}

/// Error code sent by the server, which may be numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Numeric code, e.g. `404`.
    Number(i64),
    /// Textual code, e.g. `"plugin_not_found"`.
    Text(String),
    /// The server didn't send a code.
    Unknown,
}

impl ApiErrorCode {
    /// Returns the numeric code if there is one.
    ///
    /// Textual codes made only of digits are parsed as well.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ApiErrorCode::Number(v) => Some(*v),
            ApiErrorCode::Text(v) => v.parse().ok(),
            ApiErrorCode::Unknown => None,
        }
    }

    pub(crate) fn from_json(value: Option<&serde_json::Value>) -> Self {
        match value {
            Some(serde_json::Value::Number(n)) => match n.as_i64() {
                Some(v) => ApiErrorCode::Number(v),
                None => ApiErrorCode::Text(n.to_string()),
            },
            Some(serde_json::Value::String(s)) => ApiErrorCode::Text(s.clone()),
            _ => ApiErrorCode::Unknown,
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorCode::Number(v) => write!(f, "{v}"),
            ApiErrorCode::Text(v) => f.write_str(v),
            ApiErrorCode::Unknown => f.write_str("unknown"),
        }
    }
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            api: None,
            attempts: None,
            source: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the rejection payload if this error is [`ErrorKind::ApiRejected`].
    pub fn api_error(&self) -> Option<&ApiError> {
        self.api.as_deref()
    }

    /// Number of attempts made before giving up, set for [`ErrorKind::RateLimited`].
    pub fn attempts(&self) -> Option<u32> {
        self.attempts
    }

    /// Check if the remote service rejected the request.
    pub fn is_api_error(&self) -> bool {
        self.kind == ErrorKind::ApiRejected
    }

    /// Check if the request was throttled until the retry budget ran out.
    pub fn is_rate_limited(&self) -> bool {
        self.kind == ErrorKind::RateLimited
    }
}

// Convenience constructors
impl Error {
    /// Create an api rejected error from the decoded payload
    pub fn api_rejected(api: ApiError) -> Self {
        let mut err = Self::new(ErrorKind::ApiRejected, api.to_string());
        err.api = Some(Box::new(api));
        err
    }

    /// Create a rate limited error after `attempts` tries
    pub fn rate_limited(attempts: u32) -> Self {
        let mut err = Self::new(
            ErrorKind::RateLimited,
            format!("rate limited by api, gave up after {attempts} attempts"),
        );
        err.attempts = Some(attempts);
        err
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ApiRejected => write!(f, "api rejected"),
            ErrorKind::RateLimited => write!(f, "rate limited"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::unexpected(format!("invalid json: {err}")).with_source(anyhow::Error::from(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::method::InvalidMethod> for Error {
    fn from(err: http::method::InvalidMethod) -> Self {
        Self::request_invalid(format!("invalid method: {err}")).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}
