use log::debug;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use crate::config::{Endpoint, Settings};
use crate::error::Error;

/// Classification of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Up,
    Down,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Up => f.write_str("UP"),
            Outcome::Down => f.write_str("DOWN"),
        }
    }
}

/// Something that can check one endpoint and classify it.
pub trait Probe {
    fn probe(&self, endpoint: &Endpoint) -> impl Future<Output = Outcome> + Send;
}

/// Classifies a response: UP only for a 2xx status received strictly faster
/// than `threshold`.
#[must_use]
pub fn classify(status: StatusCode, latency: Duration, threshold: Duration) -> Outcome {
    if status.is_success() && latency < threshold {
        Outcome::Up
    } else {
        Outcome::Down
    }
}

/// Probes endpoints over HTTP with a single attempt per call.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    latency_threshold: Duration,
}

impl HttpProber {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        let client = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            client,
            latency_threshold: settings.latency_threshold,
        })
    }

    /// Sends the request and waits for the full body, returning the status
    /// and the elapsed round trip.
    async fn send(&self, endpoint: &Endpoint) -> Result<(StatusCode, Duration), reqwest::Error> {
        let mut request = self
            .client
            .request(endpoint.method.clone(), endpoint.url.clone())
            .headers(endpoint.headers.clone());
        if let Some(body) = &endpoint.body {
            request = request.body(body.clone());
        }

        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        response.bytes().await?;

        Ok((status, start.elapsed()))
    }
}

impl Probe for HttpProber {
    async fn probe(&self, endpoint: &Endpoint) -> Outcome {
        match self.send(endpoint).await {
            Ok((status, latency)) => {
                let outcome = classify(status, latency, self.latency_threshold);
                debug!(
                    "{} ({}): {status} in {}ms",
                    endpoint.url,
                    endpoint.name.as_deref().unwrap_or("unnamed"),
                    latency.as_millis()
                );
                outcome
            }
            // Network errors, timeouts and TLS failures all count as DOWN
            Err(e) => {
                debug!("{}: request failed: {e}", endpoint.url);
                Outcome::Down
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use reqwest::header::HeaderMap;
    use url::Url;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const THRESHOLD: Duration = Duration::from_millis(500);

    fn endpoint(url: &str) -> Endpoint {
        Endpoint {
            name: None,
            url: Url::parse(url).unwrap(),
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    fn prober() -> HttpProber {
        HttpProber::new(&Settings::default()).unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(StatusCode::OK, Duration::from_millis(100), THRESHOLD),
            Outcome::Up
        );
        assert_eq!(
            classify(StatusCode::OK, Duration::from_millis(600), THRESHOLD),
            Outcome::Down
        );
        assert_eq!(
            classify(
                StatusCode::SERVICE_UNAVAILABLE,
                Duration::from_millis(50),
                THRESHOLD
            ),
            Outcome::Down
        );
        assert_eq!(
            classify(StatusCode::NO_CONTENT, Duration::from_millis(499), THRESHOLD),
            Outcome::Up
        );
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(StatusCode::OK, THRESHOLD, THRESHOLD), Outcome::Down);
        assert_eq!(
            classify(StatusCode::MULTIPLE_CHOICES, Duration::ZERO, THRESHOLD),
            Outcome::Down
        );
        assert_eq!(
            classify(StatusCode::from_u16(299).unwrap(), Duration::ZERO, THRESHOLD),
            Outcome::Up
        );
        assert_eq!(
            classify(StatusCode::from_u16(199).unwrap(), Duration::ZERO, THRESHOLD),
            Outcome::Down
        );
    }

    #[tokio::test]
    async fn test_fast_ok_is_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = prober()
            .probe(&endpoint(&format!("{}/health", server.uri())))
            .await;
        assert_eq!(outcome, Outcome::Up);
    }

    #[tokio::test]
    async fn test_slow_ok_is_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(600)))
            .mount(&server)
            .await;

        let outcome = prober().probe(&endpoint(&server.uri())).await;
        assert_eq!(outcome, Outcome::Down);
    }

    #[tokio::test]
    async fn test_server_error_is_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let outcome = prober().probe(&endpoint(&server.uri())).await;
        assert_eq!(outcome, Outcome::Down);
    }

    #[tokio::test]
    async fn test_timeout_is_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let settings = Settings {
            timeout: Duration::from_millis(200),
            ..Settings::default()
        };
        let prober = HttpProber::new(&settings).unwrap();

        let outcome = prober.probe(&endpoint(&server.uri())).await;
        assert_eq!(outcome, Outcome::Down);
    }

    #[tokio::test]
    async fn test_refused_connection_is_down() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = prober().probe(&endpoint(&format!("http://{addr}/"))).await;
        assert_eq!(outcome, Outcome::Down);
    }

    #[tokio::test]
    async fn test_nonexistent_host_is_down() {
        let outcome = prober()
            .probe(&endpoint("http://nonexistent.invalid/"))
            .await;
        assert_eq!(outcome, Outcome::Down);
    }

    #[tokio::test]
    async fn test_request_uses_method_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(header("x-api-key", "secret"))
            .and(body_string("payload"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let mut target = endpoint(&format!("{}/submit", server.uri()));
        target.method = Method::POST;
        target
            .headers
            .insert("x-api-key", "secret".parse().unwrap());
        target.body = Some("payload".to_string());

        assert_eq!(prober().probe(&target).await, Outcome::Up);
    }
}
