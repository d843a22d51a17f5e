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

use http::{HeaderMap, Method};
use log::{debug, info};
use serde_json::Value;

use crate::constants::PING_PATH;
use crate::sign_request::versioned_path;
use crate::time::{now, parse_timestamp};
use crate::{
    Body, Config, Context, Credential, Error, FilePart, Multipart, RequestSigner, Result,
    Transport, TransportRequest, TransportResponse,
};

const FORMAT_SUFFIX: &str = ".json";

/// ApiClient signs requests and sends them through a [`Transport`].
///
/// Cloning is cheap. Clones share the [`Context`] and with it the clock
/// offset, so `sync_clock` on one clone corrects all of them.
#[derive(Debug, Clone)]
pub struct ApiClient {
    ctx: Context,
    signer: RequestSigner,
    transport: Transport,
}

impl ApiClient {
    /// Create a client for `base_url`.
    pub fn new(ctx: Context, credential: Credential, base_url: impl Into<String>) -> Self {
        Self {
            signer: RequestSigner::new(ctx.clone(), credential),
            transport: Transport::new(ctx.clone(), base_url),
            ctx,
        }
    }

    /// Create a client from a [`Config`].
    pub fn from_config(ctx: Context, config: &Config) -> Result<Self> {
        let credential = config.credential()?;
        let client = Self::new(ctx, credential, config.base_url());
        Ok(client.with_transport(|t| t.with_timeout(config.timeout())))
    }

    /// Adjust the underlying transport, e.g. its retry policy.
    pub fn with_transport(mut self, f: impl FnOnce(Transport) -> Transport) -> Self {
        self.transport = f(self.transport);
        self
    }

    /// Context shared by the signer and the transport.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Credential requests are signed with.
    pub fn credential(&self) -> &Credential {
        self.signer.credential()
    }

    /// Signer used by this client.
    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// Sign and send a request.
    ///
    /// `path` is rooted at the API version if it isn't already. The method is
    /// uppercased before signing so the wire carries the signed verb. Headers
    /// are signed once and re-sent as is on every retry.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Body,
    ) -> Result<TransportResponse> {
        let method = uppercase_method(method)?;
        let path = versioned_path(path);
        let signed = self.signer.sign(&method, &path, &body);

        let mut headers = HeaderMap::new();
        signed.apply(&mut headers)?;

        self.transport
            .send(TransportRequest {
                method,
                path,
                body,
                headers,
            })
            .await
    }

    /// Send a signed `GET` request.
    pub async fn get(&self, path: &str) -> Result<TransportResponse> {
        self.request(Method::GET, path, Body::Empty).await
    }

    /// Send a signed `POST` request.
    pub async fn post(&self, path: &str, body: impl Into<Body>) -> Result<TransportResponse> {
        self.request(Method::POST, path, body.into()).await
    }

    /// Send a signed `PUT` request.
    pub async fn put(&self, path: &str, body: impl Into<Body>) -> Result<TransportResponse> {
        self.request(Method::PUT, path, body.into()).await
    }

    /// Send a signed `DELETE` request.
    pub async fn delete(&self, path: &str) -> Result<TransportResponse> {
        self.request(Method::DELETE, path, Body::Empty).await
    }

    /// Send a request to a path relative to the credential's scope.
    ///
    /// `api("/plugins.json", "GET", Body::Empty)` with a developer credential
    /// hits `/v1/developers/{id}/plugins.json`.
    pub async fn api(&self, path: &str, method: &str, body: Body) -> Result<TransportResponse> {
        let method = Method::from_bytes(method.trim().as_bytes())?;

        self.request(method, &self.canonize_path(path), body).await
    }

    /// Upload `files` along with the JSON `params` to a scope relative path.
    ///
    /// The payload is sent as `multipart/form-data` with the params in the
    /// `data` part, and is not hashed into the signature.
    pub async fn api_with_files(
        &self,
        path: &str,
        method: &str,
        params: Value,
        files: Vec<FilePart>,
    ) -> Result<TransportResponse> {
        let payload = files
            .into_iter()
            .fold(Multipart::new().with_data(params), Multipart::with_file);

        self.api(path, method, Body::Multipart(payload)).await
    }

    /// Resolve `path` against the credential's scope.
    ///
    /// A trailing `.json` is normalized, added when the last segment has no
    /// extension, and any query string is kept.
    pub fn canonize_path(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        let (path, query) = match path.find('?') {
            Some(pos) => path.split_at(pos),
            None => (path, ""),
        };

        let path = if path.to_ascii_lowercase().ends_with(FORMAT_SUFFIX) {
            &path[..path.len() - FORMAT_SUFFIX.len()]
        } else {
            path
        };

        let credential = self.credential();
        let mut canonized = format!(
            "/{}/{}",
            credential.scope().path_segment(),
            credential.scope_id()
        );
        if !path.is_empty() {
            canonized.push('/');
            canonized.push_str(path);
        }
        let last_segment = path.rsplit('/').next().unwrap_or_default();
        if !last_segment.contains('.') {
            canonized.push_str(FORMAT_SUFFIX);
        }
        canonized.push_str(query);
        canonized
    }

    /// Measure the offset between the local and API clocks.
    ///
    /// Returns local time at call start minus the remote `timestamp`, in
    /// seconds. The offset is not applied, see [`ApiClient::set_clock_diff`].
    pub async fn find_clock_diff(&self) -> Result<i64> {
        let local = now();
        let resp = self.get(PING_PATH).await?;

        let timestamp = resp
            .json()
            .and_then(|v| v.get("timestamp"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::unexpected("ping response carries no timestamp"))?;
        let remote = parse_timestamp(timestamp)?;

        let diff = (local - remote).num_seconds();
        debug!("clock diff against api: {diff}s");
        Ok(diff)
    }

    /// Set the clock offset applied to every signature from this context.
    pub fn set_clock_diff(&self, seconds: i64) {
        self.ctx.set_clock_diff(seconds);
    }

    /// Measure the API clock offset and apply it.
    pub async fn sync_clock(&self) -> Result<i64> {
        let diff = self.find_clock_diff().await?;
        self.set_clock_diff(diff);
        info!("clock offset set to {diff}s");
        Ok(diff)
    }

    /// Check connectivity and credentials against the ping endpoint.
    ///
    /// API rejections yield `false`, transport failures are returned as
    /// errors.
    pub async fn test(&self) -> Result<bool> {
        match self.get(PING_PATH).await {
            Ok(resp) => Ok(resp
                .json()
                .and_then(|v| v.get("api"))
                .and_then(Value::as_str)
                == Some("pong")),
            Err(err) if err.is_api_error() => {
                debug!("ping rejected: {err}");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Build a pre-authenticated `GET` url for `path`.
    pub fn signed_url(&self, path: &str, params: &[(&str, &str)]) -> String {
        self.signer
            .signed_url(self.transport.base_url(), path, params)
    }
}

/// Uppercase extension methods like `delete`; standard ones pass through.
fn uppercase_method(method: Method) -> Result<Method> {
    let upper = method.as_str().to_ascii_uppercase();
    if upper == method.as_str() {
        return Ok(method);
    }
    Ok(Method::from_bytes(upper.as_bytes())?)
}
