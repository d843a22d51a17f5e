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

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::time::{now, parse_timestamp};
use crate::{ApiError, ApiErrorCode, Error, Result};

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Body of a response with a JSON content type.
    Json(Value),
    /// Body of any other response, untouched (zip, csv, images...).
    Raw(Bytes),
}

/// A successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Decoded body.
    pub body: ResponseBody,
}

impl TransportResponse {
    /// The JSON body, if the response was JSON.
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(v) => Some(v),
            ResponseBody::Raw(_) => None,
        }
    }

    /// The raw body, if the response was not JSON.
    pub fn raw(&self) -> Option<&Bytes> {
        match &self.body {
            ResponseBody::Json(_) => None,
            ResponseBody::Raw(bs) => Some(bs),
        }
    }

    /// Deserialize the JSON body into `T`.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        match self.body {
            ResponseBody::Json(v) => Ok(serde_json::from_value(v)?),
            ResponseBody::Raw(_) => Err(Error::unexpected(format!(
                "expected json response, got raw body with status {}",
                self.status
            ))),
        }
    }
}

/// Turn a physical response into a success value or a typed error.
///
/// 429 never reaches this function, the transport handles it first.
pub(crate) fn classify(resp: http::Response<Bytes>) -> Result<TransportResponse> {
    let (parts, body) = resp.into_parts();
    let status = parts.status;

    if !is_json(&parts.headers) {
        if status.as_u16() >= 400 {
            return Err(Error::api_rejected(api_error(status, &Value::Null)));
        }
        return Ok(TransportResponse {
            status,
            body: ResponseBody::Raw(body),
        });
    }

    let value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            Error::unexpected(format!("malformed json response with status {status}: {e}"))
                .with_source(anyhow::Error::new(e))
        })?
    };

    if status.as_u16() >= 400 {
        return Err(Error::api_rejected(api_error(status, &value)));
    }

    Ok(TransportResponse {
        status,
        body: ResponseBody::Json(value),
    })
}

/// Check the media type, ignoring parameters like `charset`.
pub(crate) fn is_json(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let media_type = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    media_type == "application/json" || media_type.ends_with("+json")
}

/// Read the `error` envelope, filling in defaults for anything missing.
fn api_error(status: StatusCode, value: &Value) -> ApiError {
    let error = value.get("error");
    let field = |name: &str| error.and_then(|e| e.get(name));

    ApiError {
        status,
        error_type: field("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        message: field("message")
            .and_then(Value::as_str)
            .unwrap_or(ApiError::DEFAULT_MESSAGE)
            .to_string(),
        code: ApiErrorCode::from_json(field("code")),
        timestamp: field("timestamp")
            .and_then(Value::as_str)
            .and_then(|v| parse_timestamp(v).ok())
            .unwrap_or_else(now),
    }
}
