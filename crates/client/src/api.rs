//! REST client for the PetKit HTTP endpoints.
//!
//! Every call takes the caller's [`Session`] and logs in first when the
//! session has no valid token. Responses are unwrapped from the vendor's
//! `{"result": ..., "error": ...}` envelope.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use petkit_core::device::{Device, DeviceState, RawEvent};
use petkit_core::pets::Pet;
use petkit_core::types::DeviceId;

use crate::error::PetkitError;
use crate::session::{AccessToken, Session, SessionPayload};

/// Default vendor endpoint.
pub const DEFAULT_BASE_URL: &str = "http://api.petkt.com";

/// Default HTTP timeout for a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const PATH_LOGIN: &str = "/latest/user/login";
pub const PATH_USER_DETAILS: &str = "/latest/user/details2";
pub const PATH_DISCOVERY: &str = "/latest/discovery/device_roster";

/// Date layout of the records endpoint's `date`/`day` parameters.
const RECORD_DATE_FORMAT: &str = "%Y%m%d";

const API_VERSION: &str = "8.10.4";

/// Client identification headers the vendor expects on every call.
const CLIENT_HEADERS: &[(&str, &str)] = &[
    ("accept", "*/*"),
    ("accept-language", "en-US;q=1,zh-Hant-US;q=0.9"),
    ("x-api-version", API_VERSION),
    ("x-client", "ios(15.4.1;iPhone12,3)"),
    ("user-agent", "PETKIT/8.10.4 (iPhone; ios 15.4.1; Scale/3.00)"),
    ("x-img-version", "1"),
    ("x-locale", "en_US"),
    ("x-timezone", "-7.0"),
    ("x-timezoneid", "America/Los_Angeles"),
];

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LoginResult {
    session: SessionPayload,
}

#[derive(Debug, Deserialize)]
struct UserDetails {
    user: UserProfile,
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    /// The vendor calls every pet a dog.
    #[serde(default)]
    dogs: Vec<Pet>,
}

#[derive(Debug, Deserialize)]
struct Discovery {
    devices: Vec<DiscoveredDevice>,
}

#[derive(Debug, Deserialize)]
struct DiscoveredDevice {
    #[serde(rename = "type")]
    device_type: String,
    data: DiscoveredDeviceData,
}

#[derive(Debug, Deserialize)]
struct DiscoveredDeviceData {
    id: DeviceId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct DeviceDetail {
    state: DeviceState,
}

/// Unwrap the vendor envelope, turning an `error` payload into
/// [`PetkitError::Api`].
pub(crate) fn unwrap_envelope<T: DeserializeOwned>(
    mut body: serde_json::Value,
) -> Result<T, PetkitError> {
    let error = body.get("error").filter(|e| !e.is_null());
    if let Some(error) = error {
        let msg = error
            .get("msg")
            .and_then(|m| m.as_str())
            .map_or_else(|| error.to_string(), str::to_string);
        return Err(PetkitError::Api(msg));
    }

    let result = body
        .get_mut("result")
        .map(serde_json::Value::take)
        .ok_or_else(|| PetkitError::Decode("response has no `result` field".into()))?;

    serde_json::from_value(result).map_err(|e| PetkitError::Decode(e.to_string()))
}

// ---------------------------------------------------------------------------
// PetkitClient
// ---------------------------------------------------------------------------

/// HTTP client for the vendor API.
pub struct PetkitClient {
    client: reqwest::Client,
    base_url: String,
}

impl PetkitClient {
    /// Create a client with its own connection pool and the given timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PetkitError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Log in and install a fresh token in `session`.
    pub async fn login(&self, session: &mut Session) -> Result<(), PetkitError> {
        let creds = session.credentials();
        let form = [
            ("username", creds.username()),
            ("password", creds.password_digest()),
            ("encrypt", "1"),
        ];

        tracing::debug!(username = creds.username(), "Logging in to PetKit");

        let response = self
            .client
            .post(format!("{}{PATH_LOGIN}", self.base_url))
            .headers(client_headers())
            .form(&form)
            .send()
            .await?;

        let body = Self::parse_body(response).await?;
        let result: LoginResult = unwrap_envelope(body)?;
        let token = AccessToken::from_payload(result.session)?;

        tracing::info!(expires_at = %token.expires_at, "PetKit session established");
        session.install(token);
        Ok(())
    }

    /// Log in when `session` has no valid token and return the token id.
    pub async fn ensure_session(&self, session: &mut Session) -> Result<String, PetkitError> {
        if session.needs_refresh(Utc::now()) {
            self.login(session).await?;
        }
        session
            .token()
            .map(|t| t.id.clone())
            .ok_or_else(|| PetkitError::Session("login did not install a token".into()))
    }

    /// The account's pet roster.
    pub async fn pets(&self, session: &mut Session) -> Result<Vec<Pet>, PetkitError> {
        let details: UserDetails = self.query(session, PATH_USER_DETAILS, &[]).await?;
        Ok(details.user.dogs)
    }

    pub async fn discover_devices(&self, session: &mut Session) -> Result<Vec<Device>, PetkitError> {
        let discovery: Discovery = self.query(session, PATH_DISCOVERY, &[]).await?;
        Ok(discovery
            .devices
            .into_iter()
            .map(|d| Device::new(d.data.id, d.data.name, d.device_type))
            .collect())
    }

    pub async fn device_state(
        &self,
        session: &mut Session,
        device: &Device,
    ) -> Result<DeviceState, PetkitError> {
        let path = format!("/latest/{}/device_detail", device.endpoint_segment());
        let detail: DeviceDetail = self
            .query(session, &path, &[("id", device.id.to_string())])
            .await?;
        Ok(detail.state)
    }

    /// Raw events `device` reported on `day`.
    pub async fn device_records(
        &self,
        session: &mut Session,
        device: &Device,
        day: NaiveDate,
    ) -> Result<Vec<RawEvent>, PetkitError> {
        let path = format!("/latest/{}/getDeviceRecord", device.endpoint_segment());
        let day = day.format(RECORD_DATE_FORMAT).to_string();
        self.query(
            session,
            &path,
            &[
                ("deviceId", device.id.to_string()),
                ("date", day.clone()),
                ("day", day),
            ],
        )
        .await
    }

    // ---- private helpers ----

    /// POST an authenticated query and unwrap the response envelope.
    async fn query<T: DeserializeOwned>(
        &self,
        session: &mut Session,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, PetkitError> {
        tracing::debug!(path, "PetKit query");
        let token = self.ensure_session(session).await?;

        let session_value = HeaderValue::from_str(&token)
            .map_err(|e| PetkitError::Session(format!("token is not a valid header: {e}")))?;
        let mut headers = client_headers();
        headers.insert(HeaderName::from_static("x-session"), session_value.clone());
        headers.insert(HeaderName::from_static("f-session"), session_value);

        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .headers(headers)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .query(params)
            .send()
            .await?;

        let body = Self::parse_body(response).await?;
        unwrap_envelope(body)
    }

    /// Reject non-2xx responses and decode the JSON body.
    async fn parse_body(response: reqwest::Response) -> Result<serde_json::Value, PetkitError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PetkitError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<serde_json::Value>().await?)
    }
}

fn client_headers() -> HeaderMap {
    CLIENT_HEADERS
        .iter()
        .map(|&(name, value)| {
            (
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
