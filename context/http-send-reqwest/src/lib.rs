//! [`HttpSend`] implementation backed by [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use fsapi_core::HttpSend;
use reqwest::Client;

/// ReqwestHttpSend sends requests with a [`reqwest::Client`].
///
/// ```no_run
/// use fsapi_core::Context;
/// use fsapi_http_send_reqwest::ReqwestHttpSend;
/// use std::time::Duration;
///
/// let http = ReqwestHttpSend::with_timeout(Duration::from_secs(60)).unwrap();
/// let ctx = Context::new().with_http_send(http);
/// ```
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a ReqwestHttpSend whose client gives up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> anyhow::Result<http::Response<Bytes>> {
        let (parts, body) = req.into_parts();

        let resp = self
            .client
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers)
            .body(body)
            .send()
            .await?;

        let mut builder = http::Response::builder()
            .status(resp.status())
            .version(resp.version());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(resp.headers().clone());
        }
        let bs = resp.bytes().await?;

        Ok(builder.body(bs)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connection_error_is_reported() {
        let http = ReqwestHttpSend::default();
        let req = http::Request::builder()
            .uri("http://127.0.0.1:1/v1/ping.json")
            .body(Bytes::new())
            .unwrap();

        assert!(http.http_send(req).await.is_err());
    }

    #[tokio::test]
    async fn test_with_timeout() {
        // Accepts the connection but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let http = ReqwestHttpSend::with_timeout(Duration::from_millis(200)).unwrap();
        let req = http::Request::builder()
            .uri(format!("http://{addr}/v1/ping.json"))
            .body(Bytes::new())
            .unwrap();

        let start = std::time::Instant::now();
        let err = http.http_send(req).await.unwrap_err();
        let elapsed = start.elapsed();

        assert!(err.downcast_ref::<reqwest::Error>().unwrap().is_timeout());
        assert!(elapsed >= Duration::from_millis(150));
        assert!(elapsed < Duration::from_secs(5));
        server.abort();
    }
}
