//! Vendor login state.
//!
//! A [`Session`] is created once per process run and handed to the client
//! by `&mut` reference. The client checks [`Session::needs_refresh`] before
//! each request and logs in again when the token is missing or expired.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use md5::{Digest, Md5};
use serde::Deserialize;

use crate::error::PetkitError;

/// Layout of the vendor's `createdAt` session field (always UTC).
const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Account credentials in the form the login endpoint expects.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password_digest: String,
}

impl Credentials {
    /// The vendor never receives the plaintext password, only its
    /// lowercase hex MD5 digest.
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            password_digest: format!("{:x}", Md5::digest(password.as_bytes())),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_digest(&self) -> &str {
        &self.password_digest
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// A session token and the instant it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub id: String,
    pub expires_at: DateTime<Utc>,
}

/// `result.session` block of the login response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionPayload {
    pub id: String,
    pub created_at: String,
    pub expires_in: i64,
}

impl AccessToken {
    pub(crate) fn from_payload(payload: SessionPayload) -> Result<Self, PetkitError> {
        let created = NaiveDateTime::parse_from_str(&payload.created_at, CREATED_AT_FORMAT)
            .map_err(|e| {
                PetkitError::Session(format!(
                    "invalid createdAt '{}': {e}",
                    payload.created_at
                ))
            })?
            .and_utc();

        Ok(Self {
            id: payload.id,
            expires_at: created + Duration::seconds(payload.expires_in),
        })
    }
}

/// Credentials plus the current token, if any.
#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    token: Option<AccessToken>,
}

impl Session {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            token: None,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    /// True when there is no token or it has expired at `now`.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match &self.token {
            Some(token) => token.expires_at <= now,
            None => true,
        }
    }

    pub fn install(&mut self, token: AccessToken) {
        self.token = Some(token);
    }

    /// Forget the current token so the next request logs in again.
    pub fn invalidate(&mut self) {
        self.token = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    #[test]
    fn password_is_sent_as_md5_hex() {
        let creds = Credentials::new("me@example.com", "password");
        assert_eq!(creds.password_digest(), "5f4dcc3b5aa765d61d8327deb882cf99");
    }

    #[test]
    fn debug_output_hides_password_digest() {
        let creds = Credentials::new("me@example.com", "password");
        assert!(!format!("{creds:?}").contains("5f4dcc3b"));
    }

    #[test]
    fn token_expiry_is_created_at_plus_expires_in() {
        let token = AccessToken::from_payload(SessionPayload {
            id: "abc".into(),
            created_at: "2024-01-02T03:04:05.678Z".into(),
            expires_in: 3600,
        })
        .unwrap();

        let created = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
            + Duration::milliseconds(678);
        assert_eq!(token.expires_at, created + Duration::seconds(3600));
    }

    #[test]
    fn malformed_created_at_is_a_session_error() {
        let result = AccessToken::from_payload(SessionPayload {
            id: "abc".into(),
            created_at: "yesterday".into(),
            expires_in: 3600,
        });
        assert_matches!(result, Err(PetkitError::Session(_)));
    }

    #[test]
    fn refresh_needed_without_token_or_after_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut session = Session::new(Credentials::new("u", "p"));
        assert!(session.needs_refresh(now));

        session.install(AccessToken {
            id: "t".into(),
            expires_at: now + Duration::minutes(5),
        });
        assert!(!session.needs_refresh(now));
        assert!(session.needs_refresh(now + Duration::minutes(5)));

        session.invalidate();
        assert!(session.needs_refresh(now));
    }
}
