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
use serde_json::Value;

use crate::constants::CONTENT_TYPE_JSON;
use crate::Multipart;

/// Body of a request.
///
/// [`Body::to_bytes`] is the only serialization: the signer hashes exactly
/// the bytes the transport puts on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// Structured payload, sent as JSON.
    Json(Value),
    /// Raw payload, sent as is.
    Raw(Bytes),
    /// JSON parameters plus files, sent as `multipart/form-data`.
    ///
    /// Never hashed into the signature.
    Multipart(Multipart),
}

impl Body {
    /// Build a json body from anything serializable.
    pub fn json<T: serde::Serialize>(value: &T) -> crate::Result<Self> {
        Ok(Body::Json(serde_json::to_value(value)?))
    }

    /// Whether the body carries no content.
    ///
    /// `null`, `{}`, `[]` and `""` count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Json(Value::Null) => true,
            Body::Json(Value::Object(m)) => m.is_empty(),
            Body::Json(Value::Array(v)) => v.is_empty(),
            Body::Json(Value::String(s)) => s.is_empty(),
            Body::Json(_) => false,
            Body::Raw(bs) => bs.is_empty(),
            Body::Multipart(m) => m.is_empty(),
        }
    }

    /// Value of the `Content-Type` header, `None` when there is no body.
    pub fn content_type(&self) -> Option<String> {
        match self {
            _ if self.is_empty() => None,
            Body::Multipart(m) => Some(m.content_type()),
            _ => Some(CONTENT_TYPE_JSON.to_string()),
        }
    }

    /// Canonical bytes of this body, empty when [`Body::is_empty`].
    pub fn to_bytes(&self) -> Bytes {
        if self.is_empty() {
            return Bytes::new();
        }

        match self {
            Body::Empty => Bytes::new(),
            // Serializing a `Value` never fails: its map keys are strings.
            Body::Json(v) => Bytes::from(v.to_string()),
            Body::Raw(bs) => bs.clone(),
            Body::Multipart(m) => m.to_bytes(),
        }
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<Multipart> for Body {
    fn from(value: Multipart) -> Self {
        Body::Multipart(value)
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Body::Raw(value)
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Raw(Bytes::from(value))
    }
}

impl From<&'static str> for Body {
    fn from(value: &'static str) -> Self {
        Body::Raw(Bytes::from_static(value.as_bytes()))
    }
}
