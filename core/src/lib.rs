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

//! Core components for talking to the Freemius API.
//!
//! This crate signs requests with the `FS`/`FSP` HMAC schemes and sends them
//! through a transport that retries rate limited calls and classifies
//! everything else into typed errors.
//!
//! ## Overview
//!
//! - **Context**: holds the HTTP client, the environment and the clock offset
//!   shared by every signer built from it
//! - **RequestSigner**: computes `Date`, `Authorization` and `Content-MD5`
//!   for a request
//! - **Transport**: sends requests, retries `429` and decodes responses
//! - **ApiClient**: ties the above together
//!
//! ## Example
//!
//! ```
//! use fsapi_core::{Body, Context, Credential, RequestSigner, Scope};
//! use http::Method;
//! use serde_json::json;
//!
//! # fn main() -> fsapi_core::Result<()> {
//! let ctx = Context::new();
//! let credential = Credential::new(Scope::Developer, 17789, "pk_test", "sk_test")?;
//! let signer = RequestSigner::new(ctx.clone(), credential);
//!
//! let signed = signer.sign(
//!     &Method::POST,
//!     "/developers/17789/plugins.json",
//!     &Body::Json(json!({"title": "My Plugin"})),
//! );
//! assert!(signed.authorization.starts_with("FS 17789:pk_test:"));
//! assert!(signed.content_md5.is_some());
//!
//! // Correct future signatures for a local clock running 10s ahead.
//! ctx.set_clock_diff(10);
//! # Ok(())
//! # }
//! ```
//!
//! ## Traits
//!
//! - [`HttpSend`]: For sending HTTP requests
//! - [`Env`]: For environment variable access
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time manipulation utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod constants;
pub use constants::{API_ADDRESS, API_VERSION, SANDBOX_API_ADDRESS};

mod error;
pub use error::{ApiError, ApiErrorCode, Error, ErrorKind, Result};
mod context;
pub use context::{ClockSkew, Context, Env, HttpSend, NoopEnv, NoopHttpSend, OsEnv, StaticEnv};

mod credential;
pub use credential::{Credential, Scope};
mod config;
pub use config::Config;
mod body;
pub use body::Body;
mod multipart;
pub use multipart::{FilePart, Multipart};

mod sign_request;
pub use sign_request::{RequestSigner, SignedHeaders};
mod response;
pub use response::{ResponseBody, TransportResponse};
mod transport;
pub use transport::{RetryPolicy, Transport, TransportRequest};
mod client;
pub use client::ApiClient;
