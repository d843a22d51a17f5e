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

//! Request signing for the `FS`/`FSP` authorization schemes.

use std::fmt::Write;

use http::header::{AUTHORIZATION, DATE};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use log::debug;

use crate::constants::{API_VERSION, CONTENT_MD5, CONTENT_TYPE_JSON};
use crate::hash::{base64url_hex_hmac_sha256, hex_md5};
use crate::time::{format_http_date, now, DateTime};
use crate::{Body, Context, Credential, Result};

/// Headers produced by [`RequestSigner::sign`].
///
/// Valid only for the exact method, resource, body and date they were
/// computed over; build a new set for every logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// Value of the `Date` header.
    pub date: String,
    /// Value of the `Authorization` header.
    pub authorization: String,
    /// Value of the `Content-MD5` header, only set when a body was hashed.
    pub content_md5: Option<String>,
}

impl SignedHeaders {
    /// Insert the signed headers into `headers`, replacing existing values.
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(DATE, self.date.parse()?);
        headers.insert(AUTHORIZATION, {
            let mut value: HeaderValue = self.authorization.parse()?;
            value.set_sensitive(true);

            value
        });
        if let Some(md5) = &self.content_md5 {
            headers.insert(HeaderName::from_static(CONTENT_MD5), md5.parse()?);
        }
        Ok(())
    }

    /// Build a header map holding only the signed headers.
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(3);
        self.apply(&mut headers)?;
        Ok(headers)
    }
}

/// RequestSigner computes the authentication headers for API requests.
///
/// The signing date is the wall clock minus the clock offset carried by the
/// [`Context`], so a corrected offset applies to every signer sharing it.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    ctx: Context,
    credential: Credential,
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a signer.
    pub fn new(ctx: Context, credential: Credential) -> Self {
        Self {
            ctx,
            credential,
            time: None,
        }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Credential used by this signer.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Sign a request.
    ///
    /// `path` is the request path, optionally with a query string. The query
    /// never takes part in the signature. `Content-MD5` is only produced for
    /// non-empty `POST` and `PUT` bodies that are not multipart.
    pub fn sign(&self, method: &Method, path: &str, body: &Body) -> SignedHeaders {
        let date = format_http_date(self.signing_time());
        let verb = method.as_str().to_ascii_uppercase();

        // Only POST and PUT bodies are hashed, multipart payloads never are.
        let content_md5 = match body {
            Body::Multipart(_) => String::new(),
            _ if verb != "POST" && verb != "PUT" => String::new(),
            _ => {
                let content = body.to_bytes();
                if content.is_empty() {
                    String::new()
                } else {
                    hex_md5(&content)
                }
            }
        };

        let string_to_sign = string_to_sign(&verb, &content_md5, &date, path);
        let signature = base64url_hex_hmac_sha256(
            self.credential.secret_key().as_bytes(),
            string_to_sign.as_bytes(),
        );

        let authorization = format!(
            "{} {}:{}:{}",
            self.credential.scheme(),
            self.credential.scope_id(),
            self.credential.public_key(),
            signature
        );

        SignedHeaders {
            date,
            authorization,
            content_md5: (!content_md5.is_empty()).then_some(content_md5),
        }
    }

    /// Build a pre-authenticated `GET` url for `path`.
    ///
    /// Caller params (including any query already on `path`) come first,
    /// followed by `auth_date` and `authorization`.
    pub fn signed_url(&self, base_url: &str, path: &str, params: &[(&str, &str)]) -> String {
        let signed = self.sign(&Method::GET, path, &Body::Empty);

        let (resource, query) = match path.split_once('?') {
            Some((resource, query)) => (resource, query),
            None => (path, ""),
        };

        let mut serializer = form_urlencoded::Serializer::for_suffix(query.to_string(), 0);
        serializer.extend_pairs(params);
        serializer.append_pair("auth_date", &signed.date);
        serializer.append_pair("authorization", &signed.authorization);

        format!(
            "{}{}?{}",
            base_url.trim_end_matches('/'),
            versioned_path(resource),
            serializer.finish()
        )
    }

    fn signing_time(&self) -> DateTime {
        let now = self.time.unwrap_or_else(now);

        chrono::TimeDelta::try_seconds(self.ctx.clock_diff())
            .and_then(|skew| now.checked_sub_signed(skew))
            .unwrap_or(now)
    }
}

/// Construct string to sign
///
/// ## Format
///
/// ```text
/// VERB + "\n" +
/// Content-MD5 + "\n" +
/// Content-Type + "\n" +
/// Date + "\n" +
/// CanonicalizedResource;
/// ```
fn string_to_sign(verb: &str, content_md5: &str, date: &str, path: &str) -> String {
    let mut s = String::with_capacity(128);
    // Writing into a String never fails.
    let _ = write!(
        &mut s,
        "{}\n{}\n{}\n{}\n{}",
        verb,
        content_md5,
        CONTENT_TYPE_JSON,
        date,
        canonical_resource(path)
    );

    debug!("string to sign: {}", &s);
    s
}

/// The signed resource: path without query, rooted at the API version.
pub(crate) fn canonical_resource(path: &str) -> String {
    let resource = path.split_once('?').map_or(path, |(resource, _)| resource);
    versioned_path(resource)
}

/// Root `path` at the API version unless it already is.
///
/// `/plugins/1.json` and `/v1/plugins/1.json` both become
/// `/v1/plugins/1.json`.
pub(crate) fn versioned_path(path: &str) -> String {
    let path = path.trim_start_matches('/');
    let rooted = path == API_VERSION
        || path
            .strip_prefix(API_VERSION)
            .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'));

    if rooted {
        format!("/{path}")
    } else {
        format!("/{API_VERSION}/{path}")
    }
}
