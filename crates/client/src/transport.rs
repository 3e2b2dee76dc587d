//! HTTP transport abstraction.
//!
//! [`Transport`] is the single seam between the API client and the network.
//! [`ReqwestTransport`] is the production implementation.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub use reqwest::Method;

/// A fully built HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Returns the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status line and body of an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns `true` for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request did not produce a response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("HTTP error: {0}")]
    Http(String),
}

impl TransportError {
    /// Returns `true` when the call never completed (timeout, refused
    /// connection or cancellation).
    pub fn is_no_connection(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout(_) | TransportError::Connect(_) | TransportError::Cancelled
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

/// Sends HTTP requests.
///
/// Implementations perform no retries and no pooling guarantees are
/// assumed by callers.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + '_>>;
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport whose calls time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + '_>> {
        Box::pin(async move {
            let mut builder = self.http.request(request.method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let resp = builder.send().await?;
            let status = resp.status();
            let reason = status.canonical_reason().unwrap_or_default().to_string();
            let body = resp.bytes().await?.to_vec();

            Ok(HttpResponse {
                status: status.as_u16(),
                reason,
                body,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Starts a mock HTTP server that answers one request with `status` and
    /// `body`, and hands back the raw request it received.
    async fn mock_server(
        status: u16,
        body: &str,
    ) -> (String, tokio::task::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let mut received = Vec::new();
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                if let Ok(n) = stream.read(&mut buf).await {
                    received.extend_from_slice(&buf[..n]);
                }

                let resp = format!(
                    "HTTP/1.1 {status} Whatever\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
            received
        });

        (url, handle)
    }

    #[tokio::test]
    async fn sends_headers_and_reads_body() {
        let (url, handle) = mock_server(200, r#"{"success":true}"#).await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

        let mut request = HttpRequest::new(Method::POST, format!("{url}/authorize"));
        request.headers.push(("x-api-key".into(), "k-123".into()));
        request.body = Some(br#"{"user_identifier":"u"}"#.to_vec());

        let resp = transport.send(request).await.unwrap();
        assert_eq!(resp.status, 200);
        assert!(resp.is_success());
        assert_eq!(resp.reason, "OK");
        assert_eq!(resp.body, br#"{"success":true}"#);

        let raw = String::from_utf8_lossy(&handle.await.unwrap()).to_lowercase();
        assert!(raw.starts_with("post /authorize"));
        assert!(raw.contains("x-api-key: k-123"));
    }

    #[tokio::test]
    async fn error_status_is_a_response_not_an_error() {
        let (url, handle) = mock_server(403, r#"{"message":"Forbidden"}"#).await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

        let resp = transport
            .send(HttpRequest::new(Method::GET, format!("{url}/boards/b1")))
            .await
            .unwrap();
        assert_eq!(resp.status, 403);
        assert!(!resp.is_success());
        assert_eq!(resp.reason, "Forbidden");

        handle.abort();
    }

    #[tokio::test]
    async fn refused_connection_is_no_connection() {
        // Bind and drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let err = transport
            .send(HttpRequest::new(
                Method::GET,
                format!("http://127.0.0.1:{port}/"),
            ))
            .await
            .unwrap_err();
        assert!(err.is_no_connection(), "unexpected error: {err}");
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut request = HttpRequest::new(Method::GET, "http://x");
        request
            .headers
            .push(("Authorization".into(), "Bearer t".into()));
        assert_eq!(request.header("authorization"), Some("Bearer t"));
        assert!(request.header("x-api-key").is_none());
    }

    #[test]
    fn http_error_is_not_no_connection() {
        assert!(!TransportError::Http("boom".into()).is_no_connection());
        assert!(TransportError::Cancelled.is_no_connection());
        assert!(TransportError::Timeout("slow".into()).is_no_connection());
    }
}
