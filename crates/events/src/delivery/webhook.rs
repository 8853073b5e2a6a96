//! Webhook trigger delivery with exponential-backoff retry.
//!
//! [`WebhookDelivery`] fires a named trigger on an IFTTT Maker-style
//! endpoint, passing the notification text as `value1`. Network errors and
//! 5xx/429 responses are retried up to three times with exponential backoff
//! (1 s, 2 s, 4 s); other 4xx responses fail immediately.

use std::time::Duration;

use serde::Serialize;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// Default base URL of the trigger service.
pub const DEFAULT_WEBHOOK_URL: &str = "https://maker.ifttt.com";

/// Trigger name used when none is configured.
pub const DEFAULT_TRIGGER_EVENT: &str = "litter_box_is_full";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

impl WebhookError {
    /// Whether another attempt could succeed. Client errors such as a bad
    /// key (401/403) or an unknown trigger (404) will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::HttpStatus(status) => *status >= 500 || *status == 429,
        }
    }
}

// ---------------------------------------------------------------------------
// WebhookTrigger
// ---------------------------------------------------------------------------

/// A named trigger and the account key it fires under.
#[derive(Clone)]
pub struct WebhookTrigger {
    pub event: String,
    key: String,
}

impl WebhookTrigger {
    pub fn new(event: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            key: key.into(),
        }
    }

    /// Full trigger URL under `base_url`. Contains the key; never log it.
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/trigger/{}/json/with/key/{}",
            base_url.trim_end_matches('/'),
            self.event,
            self.key
        )
    }
}

impl std::fmt::Debug for WebhookTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookTrigger")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct TriggerPayload<'a> {
    value1: &'a str,
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

/// Fires webhook triggers.
pub struct WebhookDelivery {
    client: reqwest::Client,
    base_url: String,
    retry_delays: Vec<Duration>,
}

impl WebhookDelivery {
    /// Create a delivery service with its own HTTP client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            retry_delays: RETRY_DELAYS_SECS
                .iter()
                .map(|secs| Duration::from_secs(*secs))
                .collect(),
        })
    }

    /// Replace the backoff schedule. One retry is made per entry.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    /// Fire `trigger` with `value` as its first value, retrying on failure.
    ///
    /// Retryable failures are retried once per backoff entry. Returns the
    /// error of the last attempt made.
    pub async fn deliver(&self, trigger: &WebhookTrigger, value: &str) -> Result<(), WebhookError> {
        let url = trigger.url(&self.base_url);
        let payload = TriggerPayload { value1: value };
        let event = trigger.event.as_str();

        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match self.try_send(&url, &payload).await {
                Ok(()) => {
                    tracing::info!(event, value, "Webhook trigger delivered");
                    return Ok(());
                }
                Err(e) => e,
            };

            let delay = match self.retry_delays.get(attempt - 1) {
                Some(delay) if err.is_retryable() => *delay,
                _ => {
                    tracing::error!(event, attempt, error = %err, "Webhook delivery failed");
                    return Err(err);
                }
            };

            tracing::warn!(
                attempt,
                event,
                error = %err,
                "Webhook delivery attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, url: &str, payload: &TriggerPayload<'_>) -> Result<(), WebhookError> {
        let response = self.client.post(url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn new_does_not_panic() {
        let _delivery = WebhookDelivery::new(DEFAULT_WEBHOOK_URL, Duration::from_secs(10)).unwrap();
    }

    #[test]
    fn trigger_url_includes_event_and_key() {
        let trigger = WebhookTrigger::new(DEFAULT_TRIGGER_EVENT, "k3y");
        assert_eq!(
            trigger.url("https://maker.ifttt.com/"),
            "https://maker.ifttt.com/trigger/litter_box_is_full/json/with/key/k3y"
        );
    }

    #[test]
    fn trigger_debug_hides_key() {
        let trigger = WebhookTrigger::new("evt", "s3cret");
        assert!(!format!("{trigger:?}").contains("s3cret"));
    }

    #[test]
    fn payload_uses_value1() {
        let payload = TriggerPayload { value1: "Hall and Bath" };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"value1": "Hall and Bath"})
        );
    }

    #[test]
    fn webhook_error_display_http_status() {
        let err = WebhookError::HttpStatus(502);
        assert_eq!(err.to_string(), "Webhook returned HTTP 502");
    }

    #[test]
    fn only_server_side_failures_are_retried() {
        assert!(WebhookError::HttpStatus(500).is_retryable());
        assert!(WebhookError::HttpStatus(503).is_retryable());
        assert!(WebhookError::HttpStatus(429).is_retryable());
        assert!(!WebhookError::HttpStatus(401).is_retryable());
        assert!(!WebhookError::HttpStatus(404).is_retryable());
    }

    /// Serves one canned status per connection and counts requests.
    async fn status_server(statuses: Vec<u16>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            for status in statuses {
                let (mut socket, _) = listener.accept().await.unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
                read_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 {status} Status\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        (format!("http://{addr}"), hits)
    }

    /// Consume the request head and its `content-length` body.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + body_len {
                return;
            }
        }
    }

    fn instant_retries(base_url: &str) -> WebhookDelivery {
        WebhookDelivery::new(base_url, Duration::from_secs(5))
            .unwrap()
            .with_retry_delays(vec![Duration::ZERO; 3])
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let (base_url, hits) = status_server(vec![401]).await;
        let delivery = instant_retries(&base_url);

        let err = delivery
            .deliver(&WebhookTrigger::new("evt", "bad-key"), "Hall")
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::HttpStatus(401)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_report_the_last_failure() {
        let (base_url, hits) = status_server(vec![500, 502, 503, 504]).await;
        let delivery = instant_retries(&base_url);

        let err = delivery
            .deliver(&WebhookTrigger::new("evt", "k"), "Hall")
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::HttpStatus(504)));
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn retry_succeeds_after_server_error() {
        let (base_url, hits) = status_server(vec![503, 200]).await;
        let delivery = instant_retries(&base_url);

        delivery
            .deliver(&WebhookTrigger::new("evt", "k"), "Hall")
            .await
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn webhook_error_display_request() {
        // Build a reqwest error from an invalid URL.
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err = WebhookError::Request(req_err);
        assert!(err.to_string().contains("HTTP request failed"));
    }
}
