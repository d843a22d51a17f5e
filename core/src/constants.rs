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

//! Constants shared by the signer and the transport.

use std::time::Duration;

/// API version segment every canonical resource is rooted at.
pub const API_VERSION: &str = "v1";

/// Content type bound into every signature and sent with every body.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Header carrying the hex MD5 of the request body.
pub const CONTENT_MD5: &str = "content-md5";

/// Scheme tag for HMAC signatures with a distinct secret key.
pub const SCHEME_SECRET: &str = "FS";
/// Scheme tag used when the secret key equals the public key.
pub const SCHEME_PUBLIC: &str = "FSP";

/// Health check path, relative to the host.
pub const PING_PATH: &str = "/v1/ping.json";

/// Production API address.
pub const API_ADDRESS: &str = "https://api.freemius.com";
/// Sandbox API address.
pub const SANDBOX_API_ADDRESS: &str = "https://sandbox-api.freemius.com";

/// Default per-attempt request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("fs-rust-", env!("CARGO_PKG_VERSION"));

// Env values used to build a config.
pub const FS_API_SCOPE: &str = "FS_API_SCOPE";
pub const FS_API_SCOPE_ID: &str = "FS_API_SCOPE_ID";
pub const FS_API_PUBLIC_KEY: &str = "FS_API_PUBLIC_KEY";
pub const FS_API_SECRET_KEY: &str = "FS_API_SECRET_KEY";
pub const FS_API_SANDBOX: &str = "FS_API_SANDBOX";
pub const FS_API_BASE_URL: &str = "FS_API_BASE_URL";
pub const FS_API_TIMEOUT: &str = "FS_API_TIMEOUT";
