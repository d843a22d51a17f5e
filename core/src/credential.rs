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

use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use crate::constants::{SCHEME_PUBLIC, SCHEME_SECRET};
use crate::utils::Redact;
use crate::{Error, Result};

/// Scope is the authorization context an API key is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Developer account.
    Developer,
    /// A single plugin or theme.
    Plugin,
    /// A single install of a plugin.
    Install,
    /// An end user.
    User,
    /// An app.
    App,
    /// A store.
    Store,
}

impl Scope {
    /// The resource collection this scope lives in, e.g. `developers`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Scope::Developer => "developers",
            Scope::Plugin => "plugins",
            Scope::Install => "installs",
            Scope::User => "users",
            Scope::App => "apps",
            Scope::Store => "stores",
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Scope::Developer => "developer",
            Scope::Plugin => "plugin",
            Scope::Install => "install",
            Scope::User => "user",
            Scope::App => "app",
            Scope::Store => "store",
        };
        f.write_str(s)
    }
}

impl FromStr for Scope {
    type Err = Error;

    /// Accepts both `developer` and the path form `developers`.
    fn from_str(s: &str) -> Result<Self> {
        let scope = match s.trim().to_ascii_lowercase().as_str() {
            "developer" | "developers" => Scope::Developer,
            "plugin" | "plugins" => Scope::Plugin,
            "install" | "installs" => Scope::Install,
            "user" | "users" => Scope::User,
            "app" | "apps" => Scope::App,
            "store" | "stores" => Scope::Store,
            v => return Err(Error::config_invalid(format!("invalid scope: {v}"))),
        };
        Ok(scope)
    }
}

/// Credential used to sign requests.
///
/// Immutable once constructed, share it freely between tasks.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    scope: Scope,
    scope_id: u64,
    public_key: String,
    secret_key: String,
}

impl Credential {
    /// Create a new credential.
    ///
    /// Empty keys or a zero scope id are configuration errors.
    pub fn new(
        scope: Scope,
        scope_id: u64,
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self> {
        let public_key = public_key.into();
        let secret_key = secret_key.into();

        if scope_id == 0 {
            return Err(Error::config_invalid("scope id must be a positive integer"));
        }
        if public_key.is_empty() {
            return Err(Error::config_invalid("public key is empty"));
        }
        if secret_key.is_empty() {
            return Err(Error::config_invalid("secret key is empty"));
        }

        Ok(Self {
            scope,
            scope_id,
            public_key,
            secret_key,
        })
    }

    /// Scope the keys are bound to.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Id of the scope entity.
    pub fn scope_id(&self) -> u64 {
        self.scope_id
    }

    /// Public key.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub(crate) fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Whether the keys use the public-hash scheme, i.e. the secret equals
    /// the public key.
    pub fn is_public_hash(&self) -> bool {
        self.secret_key == self.public_key
    }

    /// Authorization scheme tag: `FS` or `FSP`.
    pub fn scheme(&self) -> &'static str {
        if self.is_public_hash() {
            SCHEME_PUBLIC
        } else {
            SCHEME_SECRET
        }
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("scope", &self.scope)
            .field("scope_id", &self.scope_id)
            .field("public_key", &Redact::from(&self.public_key))
            .field("secret_key", &Redact::from(&self.secret_key))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("developer", Scope::Developer)]
    #[test_case("plugins", Scope::Plugin)]
    #[test_case(" Install ", Scope::Install)]
    #[test_case("users", Scope::User)]
    #[test_case("APP", Scope::App)]
    #[test_case("store", Scope::Store)]
    fn test_scope_from_str(input: &str, expected: Scope) {
        assert_eq!(input.parse::<Scope>().unwrap(), expected);
    }

    #[test]
    fn test_scope_from_str_invalid() {
        let err = "vendor".parse::<Scope>().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_scheme_selection() {
        let cred = Credential::new(Scope::Install, 1, "k1", "k1").unwrap();
        assert!(cred.is_public_hash());
        assert_eq!(cred.scheme(), "FSP");

        let cred = Credential::new(Scope::Developer, 1, "pk_y", "sk_x").unwrap();
        assert!(!cred.is_public_hash());
        assert_eq!(cred.scheme(), "FS");
    }

    #[test]
    fn test_credential_invalid() {
        let cases = vec![
            (0, "pk", "sk"),
            (1, "", "sk"),
            (1, "pk", ""),
        ];

        for (id, pk, sk) in cases {
            let err = Credential::new(Scope::Developer, id, pk, sk).unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::ConfigInvalid);
        }
    }

    #[test]
    fn test_credential_debug_redacts_secret() {
        let cred = Credential::new(
            Scope::Developer,
            17789,
            "pk_1d9681cd78bc9c6a8cb06725170acf7e",
            "sk_2d1OYzOTvsEB39TYc3K9Ka9",
        )
        .unwrap();

        let s = format!("{cred:?}");
        assert!(!s.contains("sk_2d1OYzOTvsEB39TYc3K9Ka9"));
        assert!(s.contains("sk_***Ka9"));
        assert!(s.contains("17789"));
    }
}
