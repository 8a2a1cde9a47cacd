use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Token issuance payload returned by both the login and refresh endpoints.
///
/// Every field is optional at the parsing layer so that a response missing
/// one is reported as `MalformedCredential` instead of a generic decode error.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<i64>,
    pub refresh_expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
}

impl LoginResponse {
    /// Fully populated response, mostly for tests and fakes.
    pub fn new(
        access_token: &str,
        expires_in: i64,
        refresh_token: &str,
        refresh_expires_in: i64,
    ) -> Self {
        Self {
            access_token: Some(access_token.to_string()),
            expires_in: Some(expires_in),
            refresh_expires_in: Some(refresh_expires_in),
            refresh_token: Some(refresh_token.to_string()),
            token_type: Some("bearer".to_string()),
        }
    }
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .field("refresh_expires_in", &self.refresh_expires_in)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// The access/refresh token pair with absolute expiry instants.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
    pub token_type: String,
}

fn required_text(value: &Option<String>, field: &str) -> Result<String, ApiError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ApiError::MalformedCredential(format!("missing {}", field))),
    }
}

/// `issued_at + value` seconds, rejecting missing, negative or out-of-range values
fn required_expiry(
    value: Option<i64>,
    issued_at: DateTime<Utc>,
    field: &str,
) -> Result<DateTime<Utc>, ApiError> {
    let secs = match value {
        Some(secs) if secs >= 0 => secs,
        Some(secs) => {
            return Err(ApiError::MalformedCredential(format!(
                "negative {}: {}",
                field, secs
            )))
        }
        None => return Err(ApiError::MalformedCredential(format!("missing {}", field))),
    };
    Duration::try_seconds(secs)
        .and_then(|d| issued_at.checked_add_signed(d))
        .ok_or_else(|| ApiError::MalformedCredential(format!("{} out of range: {}", field, secs)))
}

impl Credential {
    /// Build a credential from a backend response issued at `issued_at`.
    ///
    /// Expiries are anchored to `issued_at`; the relative `*_expires_in`
    /// durations are never stored.
    pub fn from_response(
        response: &LoginResponse,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let access_token = required_text(&response.access_token, "access_token")?;
        let refresh_token = required_text(&response.refresh_token, "refresh_token")?;
        let token_type = required_text(&response.token_type, "token_type")?;
        let access_expires_at = required_expiry(response.expires_in, issued_at, "expires_in")?;
        let refresh_expires_at =
            required_expiry(response.refresh_expires_in, issued_at, "refresh_expires_in")?;

        Ok(Self {
            access_token,
            access_expires_at,
            refresh_token,
            refresh_expires_at,
            token_type,
        })
    }

    pub fn is_access_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.access_expires_at
    }

    pub fn is_refresh_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.refresh_expires_at
    }

    /// Get minutes remaining until the access token expires (for display)
    pub fn minutes_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.access_expires_at - now).num_minutes().max(0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("access_expires_at", &self.access_expires_at)
            .field("refresh_token", &"<redacted>")
            .field("refresh_expires_at", &self.refresh_expires_at)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// A session is valid when a credential exists and its access token has not
/// yet expired at `now`.
pub fn is_valid(credential: Option<&Credential>, now: DateTime<Utc>) -> bool {
    credential.map(|c| c.is_access_valid(now)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issued_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn test_from_response_anchors_expiry_to_issuance() {
        let t = issued_at();
        let c = Credential::from_response(&LoginResponse::new("a1", 3600, "r1", 86400), t)
            .expect("complete response");
        assert_eq!(c.access_token, "a1");
        assert_eq!(c.refresh_token, "r1");
        assert_eq!(c.token_type, "bearer");
        assert_eq!(c.access_expires_at, t + Duration::seconds(3600));
        assert_eq!(c.refresh_expires_at, t + Duration::seconds(86400));
    }

    #[test]
    fn test_from_response_rejects_missing_fields() {
        let t = issued_at();
        let full = LoginResponse::new("a1", 3600, "r1", 86400);

        let mut r = full.clone();
        r.access_token = None;
        assert!(matches!(
            Credential::from_response(&r, t),
            Err(ApiError::MalformedCredential(ref m)) if m.contains("access_token")
        ));

        let mut r = full.clone();
        r.refresh_token = Some("   ".to_string());
        assert!(matches!(
            Credential::from_response(&r, t),
            Err(ApiError::MalformedCredential(_))
        ));

        let mut r = full.clone();
        r.expires_in = None;
        assert!(matches!(
            Credential::from_response(&r, t),
            Err(ApiError::MalformedCredential(ref m)) if m.contains("expires_in")
        ));

        let mut r = full.clone();
        r.refresh_expires_in = Some(-1);
        assert!(matches!(
            Credential::from_response(&r, t),
            Err(ApiError::MalformedCredential(_))
        ));

        let mut r = full;
        r.token_type = None;
        assert!(Credential::from_response(&r, t).is_err());
    }

    #[test]
    fn test_from_response_rejects_out_of_range_lifetimes() {
        let t = issued_at();

        let r = LoginResponse::new("a1", i64::MAX, "r1", 86400);
        assert!(matches!(
            Credential::from_response(&r, t),
            Err(ApiError::MalformedCredential(ref m)) if m.contains("expires_in")
        ));

        // Representable as a duration, but past the latest representable date
        let r = LoginResponse::new("a1", 3600, "r1", i64::MAX / 1000);
        assert!(matches!(
            Credential::from_response(&r, t),
            Err(ApiError::MalformedCredential(ref m)) if m.contains("refresh_expires_in")
        ));
    }

    #[test]
    fn test_parse_login_response_json() {
        let json = r#"{"access_token": "a1", "expires_in": 3600, "refresh_expires_in": 86400, "refresh_token": "r1", "token_type": "bearer"}"#;
        let r: LoginResponse = serde_json::from_str(json).expect("login JSON");
        assert_eq!(r, LoginResponse::new("a1", 3600, "r1", 86400));

        // Missing fields parse, but do not make a credential
        let r: LoginResponse = serde_json::from_str(r#"{"access_token": "a1"}"#).expect("partial JSON");
        assert!(Credential::from_response(&r, issued_at()).is_err());
    }

    #[test]
    fn test_is_valid() {
        let t = issued_at();
        let c = Credential::from_response(&LoginResponse::new("a1", 3600, "r1", 86400), t)
            .expect("complete response");

        assert!(!is_valid(None, t));
        assert!(is_valid(Some(&c), t));
        assert!(is_valid(Some(&c), t + Duration::seconds(3599)));
        assert!(!is_valid(Some(&c), t + Duration::seconds(3600)));
        assert!(!is_valid(Some(&c), t + Duration::seconds(3601)));
        assert!(c.is_refresh_valid(t + Duration::seconds(3601)));
    }

    #[test]
    fn test_minutes_until_expiry() {
        let t = issued_at();
        let c = Credential::from_response(&LoginResponse::new("a1", 3600, "r1", 86400), t)
            .expect("complete response");
        assert_eq!(c.minutes_until_expiry(t), 60);
        assert_eq!(c.minutes_until_expiry(t + Duration::minutes(45)), 15);
        assert_eq!(c.minutes_until_expiry(t + Duration::hours(2)), 0);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let c = Credential::from_response(&LoginResponse::new("secret-a", 60, "secret-r", 120), issued_at())
            .expect("complete response");
        let shown = format!("{:?}", c);
        assert!(!shown.contains("secret-a"));
        assert!(!shown.contains("secret-r"));

        let shown = format!("{:?}", LoginResponse::new("secret-a", 60, "secret-r", 120));
        assert!(!shown.contains("secret"));
    }
}
