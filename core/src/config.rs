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

use std::fmt::{Debug, Formatter};
use std::time::Duration;

use log::debug;

use crate::constants::*;
use crate::utils::Redact;
use crate::{Context, Credential, Error, Result, Scope};

/// Config carries all the configuration for an API client.
#[derive(Clone, Default)]
pub struct Config {
    /// `scope` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`FS_API_SCOPE`]
    pub scope: Option<Scope>,
    /// `scope_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`FS_API_SCOPE_ID`]
    pub scope_id: Option<u64>,
    /// `public_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`FS_API_PUBLIC_KEY`]
    pub public_key: Option<String>,
    /// `secret_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`FS_API_SECRET_KEY`]
    pub secret_key: Option<String>,
    /// `sandbox` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`FS_API_SANDBOX`]
    pub sandbox: Option<bool>,
    /// `base_url` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`FS_API_BASE_URL`]
    ///
    /// Takes precedence over `sandbox`.
    pub base_url: Option<String>,
    /// `timeout` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`FS_API_TIMEOUT`] in seconds
    pub timeout: Option<Duration>,
}

impl Config {
    /// Create a new Config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set scope
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Set scope_id
    pub fn with_scope_id(mut self, scope_id: u64) -> Self {
        self.scope_id = Some(scope_id);
        self
    }

    /// Set public_key
    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    /// Set secret_key
    pub fn with_secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(secret_key.into());
        self
    }

    /// Use the sandbox API address.
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    /// Set base_url
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Load config from env.
    ///
    /// Fields already set are kept. Values that fail to parse are errors
    /// rather than silently ignored.
    pub fn from_env(mut self, ctx: &Context) -> Result<Self> {
        if self.scope.is_none() {
            if let Some(v) = ctx.env_var(FS_API_SCOPE) {
                self.scope = Some(v.parse()?);
            }
        }
        if self.scope_id.is_none() {
            if let Some(v) = ctx.env_var(FS_API_SCOPE_ID) {
                self.scope_id = Some(v.trim().parse().map_err(|e| {
                    Error::config_invalid(format!("invalid {FS_API_SCOPE_ID}: {v}"))
                        .with_source(anyhow::Error::new(e))
                })?);
            }
        }
        if let Some(v) = ctx.env_var(FS_API_PUBLIC_KEY) {
            self.public_key.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(FS_API_SECRET_KEY) {
            self.secret_key.get_or_insert(v);
        }
        if self.sandbox.is_none() {
            if let Some(v) = ctx.env_var(FS_API_SANDBOX) {
                self.sandbox = Some(parse_bool(&v));
            }
        }
        if let Some(v) = ctx.env_var(FS_API_BASE_URL) {
            self.base_url.get_or_insert(v);
        }
        if self.timeout.is_none() {
            if let Some(v) = ctx.env_var(FS_API_TIMEOUT) {
                let secs: u64 = v.trim().parse().map_err(|e| {
                    Error::config_invalid(format!("invalid {FS_API_TIMEOUT}: {v}"))
                        .with_source(anyhow::Error::new(e))
                })?;
                self.timeout = Some(Duration::from_secs(secs));
            }
        }

        debug!("config loaded from env: {self:?}");
        Ok(self)
    }

    /// Build the credential, failing fast on anything missing.
    pub fn credential(&self) -> Result<Credential> {
        let scope = self
            .scope
            .ok_or_else(|| Error::config_invalid("scope is required"))?;
        let scope_id = self
            .scope_id
            .ok_or_else(|| Error::config_invalid("scope id is required"))?;
        let public_key = self
            .public_key
            .clone()
            .ok_or_else(|| Error::config_invalid("public key is required"))?;
        let secret_key = self
            .secret_key
            .clone()
            .ok_or_else(|| Error::config_invalid("secret key is required"))?;

        Credential::new(scope, scope_id, public_key, secret_key)
    }

    /// API address requests are sent to, without a trailing slash.
    pub fn base_url(&self) -> String {
        let url = match (&self.base_url, self.sandbox) {
            (Some(url), _) => url.as_str(),
            (None, Some(true)) => SANDBOX_API_ADDRESS,
            (None, _) => API_ADDRESS,
        };
        url.trim_end_matches('/').to_string()
    }

    /// Per-attempt request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("scope", &self.scope)
            .field("scope_id", &self.scope_id)
            .field("public_key", &self.public_key.as_ref().map(Redact::from))
            .field("secret_key", &self.secret_key.as_ref().map(Redact::from))
            .field("sandbox", &self.sandbox)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}
