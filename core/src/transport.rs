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

use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use log::{debug, warn};

use crate::constants::{DEFAULT_TIMEOUT, USER_AGENT as FS_USER_AGENT};
use crate::response::classify;
use crate::{Body, Context, Error, Result, TransportResponse};

/// RetryPolicy bounds how often a throttled request is retried.
///
/// Only `429 Too Many Requests` is retried. Connection failures, timeouts
/// and every other status surface immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Fixed delay between two attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Upper bound of the time spent sleeping before giving up.
    pub fn max_backoff(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

/// A single logical request.
#[derive(Debug, Clone, Default)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the base url, query string included.
    pub path: String,
    /// Request body.
    pub body: Body,
    /// Headers, typically the signed ones.
    pub headers: HeaderMap,
}

impl TransportRequest {
    /// Create a request without body or headers.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: Body::Empty,
            headers: HeaderMap::new(),
        }
    }

    /// Set the body.
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Set the headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Transport executes requests against the API and classifies responses.
///
/// Every attempt of one logical request sends the same headers, so a
/// signature computed once stays consistent with the `Date` sent next to
/// it on every retry.
#[derive(Debug, Clone)]
pub struct Transport {
    ctx: Context,
    base_url: String,
    retry: RetryPolicy,
    timeout: Duration,
}

impl Transport {
    /// Create a transport for `base_url`, e.g. `https://api.freemius.com`.
    pub fn new(ctx: Context, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            ctx,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base url requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retry policy in use.
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Send a `GET` request.
    pub async fn get(&self, path: &str, headers: HeaderMap) -> Result<TransportResponse> {
        self.send(TransportRequest::new(Method::GET, path).with_headers(headers))
            .await
    }

    /// Send a `POST` request.
    pub async fn post(
        &self,
        path: &str,
        body: Body,
        headers: HeaderMap,
    ) -> Result<TransportResponse> {
        self.send(
            TransportRequest::new(Method::POST, path)
                .with_body(body)
                .with_headers(headers),
        )
        .await
    }

    /// Send a `PUT` request.
    pub async fn put(
        &self,
        path: &str,
        body: Body,
        headers: HeaderMap,
    ) -> Result<TransportResponse> {
        self.send(
            TransportRequest::new(Method::PUT, path)
                .with_body(body)
                .with_headers(headers),
        )
        .await
    }

    /// Send a `DELETE` request.
    pub async fn delete(&self, path: &str, headers: HeaderMap) -> Result<TransportResponse> {
        self.send(TransportRequest::new(Method::DELETE, path).with_headers(headers))
            .await
    }

    /// Send a request, retrying while the API answers `429`.
    pub async fn send(&self, req: TransportRequest) -> Result<TransportResponse> {
        let url = format!("{}{}", self.base_url, req.path);
        let body = req.body.to_bytes();
        let content_type = req
            .body
            .content_type()
            .map(|v| HeaderValue::from_str(&v))
            .transpose()?;
        let max_attempts = self.retry.max_attempts.max(1);

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!("{} {} (attempt {attempt}/{max_attempts})", req.method, url);

            let http_req = self.build(
                &req.method,
                &url,
                &req.headers,
                content_type.clone(),
                body.clone(),
            )?;
            let resp = match tokio::time::timeout(self.timeout, self.ctx.http_send(http_req)).await
            {
                Ok(resp) => resp?,
                Err(_) => {
                    return Err(Error::unexpected(format!(
                        "{} {url} timed out after {:?}",
                        req.method, self.timeout
                    )))
                }
            };

            if resp.status() != StatusCode::TOO_MANY_REQUESTS {
                return classify(resp);
            }

            if attempt >= max_attempts {
                return Err(Error::rate_limited(attempt));
            }

            warn!(
                "{} {url} rate limited, retrying in {:?} (attempt {attempt}/{max_attempts})",
                req.method, self.retry.delay
            );
            tokio::time::sleep(self.retry.delay).await;
        }
    }

    fn build(
        &self,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
        content_type: Option<HeaderValue>,
        body: Bytes,
    ) -> Result<http::Request<Bytes>> {
        let mut req = http::Request::builder()
            .method(method.clone())
            .uri(url)
            .body(Bytes::new())?;

        let req_headers = req.headers_mut();
        req_headers.insert(USER_AGENT, HeaderValue::from_static(FS_USER_AGENT));
        req_headers.extend(headers.clone());
        if let Some(content_type) = content_type {
            req_headers.insert(CONTENT_TYPE, content_type);
        }
        *req.body_mut() = body;

        Ok(req)
    }
}
