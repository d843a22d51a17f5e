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

use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use serde_json::Value;

use crate::constants::CONTENT_TYPE_JSON;
use crate::{Error, Result};

/// Name of the part carrying the JSON parameters.
const DATA_PART: &str = "data";

/// A `multipart/form-data` payload: optional JSON parameters plus files.
///
/// The boundary is fixed at construction, so encoding the same payload
/// twice yields the same bytes and retries stay byte-identical.
#[derive(Debug, Clone, PartialEq)]
pub struct Multipart {
    boundary: String,
    data: Option<Value>,
    files: Vec<FilePart>,
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}

impl Multipart {
    /// Create an empty payload with a random boundary.
    pub fn new() -> Self {
        Self::with_boundary(format!("----{:016x}", rand::random::<u64>()))
    }

    /// Create an empty payload with the given boundary.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            data: None,
            files: Vec::new(),
        }
    }

    /// Set the JSON parameters, sent as the `data` part.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Append a file part.
    pub fn with_file(mut self, file: FilePart) -> Self {
        self.files.push(file);
        self
    }

    /// Boundary separating the parts.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// File parts in order.
    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    /// Value of the `Content-Type` header for this payload.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Whether there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.data.is_none() && self.files.is_empty()
    }

    /// Encode the payload.
    pub fn to_bytes(&self) -> Bytes {
        if self.is_empty() {
            return Bytes::new();
        }

        let mut buf = BytesMut::new();
        if let Some(data) = &self.data {
            self.write_part(
                &mut buf,
                DATA_PART,
                None,
                CONTENT_TYPE_JSON,
                data.to_string().as_bytes(),
            );
        }
        for file in &self.files {
            self.write_part(
                &mut buf,
                &file.name,
                Some(&file.filename),
                &file.content_type,
                &file.content,
            );
        }
        buf.put_slice(format!("--{}--\r\n", self.boundary).as_bytes());

        buf.freeze()
    }

    fn write_part(
        &self,
        buf: &mut BytesMut,
        name: &str,
        filename: Option<&str>,
        content_type: &str,
        content: &[u8],
    ) {
        let mut disposition = format!("form-data; name=\"{}\"", escape_quoted(name));
        if let Some(filename) = filename {
            disposition.push_str(&format!("; filename=\"{}\"", escape_quoted(filename)));
        }

        buf.put_slice(
            format!(
                "--{}\r\nContent-Disposition: {disposition}\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        buf.put_slice(content);
        buf.put_slice(b"\r\n");
    }
}

/// A file sent as one part of a [`Multipart`] payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    name: String,
    filename: String,
    content_type: String,
    content: Bytes,
}

impl FilePart {
    /// Create a file part, deriving the content type from `filename`.
    ///
    /// Only the types the API accepts for uploads are known: zip, jpg/jpeg,
    /// png and gif. Anything else is rejected.
    pub fn new(
        name: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Result<Self> {
        let filename = filename.into();
        let content_type = mime_type(&filename)
            .ok_or_else(|| Error::request_invalid(format!("unknown file type: {filename}")))?;

        Ok(Self {
            name: name.into(),
            filename,
            content_type: content_type.to_string(),
            content: content.into(),
        })
    }

    /// Read a file from disk into a part named `name`.
    pub async fn from_path(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|v| v.to_str())
            .ok_or_else(|| {
                Error::request_invalid(format!("invalid file path: {}", path.display()))
            })?
            .to_string();

        let content = tokio::fs::read(path).await.map_err(|e| {
            Error::request_invalid(format!("failed to read {}", path.display()))
                .with_source(anyhow::Error::new(e))
        })?;

        Self::new(name, filename, content)
    }

    /// Override the derived content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Form field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name sent to the server.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Content type of the part.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

fn mime_type(filename: &str) -> Option<&'static str> {
    let (_, ext) = filename.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "zip" => Some("application/zip"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

fn escape_quoted(v: &str) -> String {
    v.replace('"', "%22").replace(['\r', '\n'], " ")
}
