mod client;
mod live;

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use fsapi_core::{ApiClient, Context, Credential, HttpSend, Scope};
use http::header::CONTENT_TYPE;

/// A request as seen by [`MockApi`].
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: http::Method,
    pub uri: String,
    pub headers: http::HeaderMap,
    pub body: Bytes,
}

type Handler = dyn Fn(usize, &Seen) -> (u16, &'static str, String) + Send + Sync;

/// In-process stand-in for the API.
///
/// The handler receives the zero based attempt index and the request and
/// returns status, content type and body.
#[derive(Clone)]
pub struct MockApi {
    handler: Arc<Handler>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockApi {
    pub fn new(
        handler: impl Fn(usize, &Seen) -> (u16, &'static str, String) + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Arc::new(handler),
            seen: Arc::default(),
        }
    }

    /// Always answer with the same response.
    pub fn fixed(status: u16, content_type: &'static str, body: &str) -> Self {
        let body = body.to_string();
        Self::new(move |_, _| (status, content_type, body.clone()))
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

impl Debug for MockApi {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockApi").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl HttpSend for MockApi {
    async fn http_send(&self, req: http::Request<Bytes>) -> anyhow::Result<http::Response<Bytes>> {
        let (parts, body) = req.into_parts();
        let seen = Seen {
            method: parts.method,
            uri: parts.uri.to_string(),
            headers: parts.headers,
            body,
        };

        let attempt = {
            let mut guard = self.seen.lock().unwrap();
            guard.push(seen.clone());
            guard.len() - 1
        };

        let (status, content_type, body) = (self.handler)(attempt, &seen);
        Ok(http::Response::builder()
            .status(status)
            .header(CONTENT_TYPE, content_type)
            .body(Bytes::from(body))?)
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_client(api: MockApi) -> ApiClient {
    init_logger();

    let credential = Credential::new(Scope::Developer, 17789, "pk_test", "sk_test")
        .expect("credential must be valid");
    ApiClient::new(
        Context::new().with_http_send(api),
        credential,
        "http://127.0.0.1:9900",
    )
}
