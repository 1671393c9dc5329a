//! HTTP transport used by the fetcher.

use crate::error::TransportError;
use std::time::Duration;
use tracing::debug;

/// Performs one blocking GET and returns the response body.
///
/// `get` takes `&mut self`: a transport serves one read at a time, and a
/// caller that wants concurrent reads gives each its own transport.
pub trait HttpTransport {
    fn get(&mut self, url: &str, headers: &[(String, String)]) -> Result<String, TransportError>;
}

impl<F> HttpTransport for F
where
    F: FnMut(&str, &[(String, String)]) -> Result<String, TransportError>,
{
    fn get(&mut self, url: &str, headers: &[(String, String)]) -> Result<String, TransportError> {
        self(url, headers)
    }
}

/// Transport backed by a blocking `reqwest` client. The client keeps its
/// connection pool across requests.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(Self { client })
    }

    /// Builds a transport whose requests fail after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&mut self, url: &str, headers: &[(String, String)]) -> Result<String, TransportError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send()?;
        let status = response.status();
        debug!(url, status = status.as_u16(), "GET");

        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
            });
        }

        Ok(response.text()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{Read, Write},
        net::TcpListener,
        thread::{self, JoinHandle},
    };

    /// Accepts one connection on a local port, answers it with `response`
    /// after `delay`, and hands back the raw request head.
    fn serve_once(response: &'static str, delay: Duration) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/posts?per_page=10", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            thread::sleep(delay);
            let _ = stream.write_all(response.as_bytes());
            String::from_utf8_lossy(&request).into_owned()
        });

        (url, handle)
    }

    #[test]
    fn test_success_returns_body_and_sends_headers() {
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n[]",
            Duration::ZERO,
        );
        let mut transport = ReqwestTransport::new().unwrap();
        let headers = vec![
            ("X-Client".to_string(), "reports".to_string()),
            ("Authorization".to_string(), "Bearer t".to_string()),
        ];

        let body = transport.get(&url, &headers).unwrap();
        assert_eq!(body, "[]");

        let request = server.join().unwrap().to_lowercase();
        assert!(request.starts_with("get /posts?per_page=10 "));
        assert!(request.contains("x-client: reports"));
        assert!(request.contains("authorization: bearer t"));
    }

    #[test]
    fn test_error_status_maps_to_status_code() {
        let (url, server) = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            Duration::ZERO,
        );
        let mut transport = ReqwestTransport::from_client(reqwest::blocking::Client::new());

        let err = transport.get(&url, &[]).unwrap_err();
        assert!(matches!(err, TransportError::Status { code: 503 }));
        server.join().unwrap();
    }

    #[test]
    fn test_timeout_is_a_request_error() {
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            Duration::from_millis(1500),
        );
        let mut transport = ReqwestTransport::with_timeout(Duration::from_millis(200)).unwrap();

        let err = transport.get(&url, &[]).unwrap_err();
        match err {
            TransportError::Request(e) => assert!(e.is_timeout()),
            other => panic!("expected a timeout, got {other:?}"),
        }
        server.join().unwrap();
    }
}
