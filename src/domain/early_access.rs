use crate::config::INVALID_EMAIL_MESSAGE;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized email address (trimmed, lowercased, `local@domain.tld` shaped).
///
/// Normalization happens once at construction so the uniqueness key used by the
/// record store is always the same string that gets persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let normalized = normalize_email(raw);
        if is_valid_email(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(AppError::InvalidInput(INVALID_EMAIL_MESSAGE.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for EmailAddress {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Mirrors `^[^\s@]+@[^\s@]+\.[^\s@]+$`: exactly one `@`, no whitespace, and a
/// domain with a dot that has at least one character on each side.
pub fn is_valid_email(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Best-effort information about who submitted a signup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Builds client info from raw header values. The first hop of
    /// `X-Forwarded-For` wins over `X-Real-IP`.
    pub fn from_headers(
        forwarded_for: Option<&str>,
        real_ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Self {
        let ip_address = forwarded_for
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| real_ip.map(str::trim).filter(|v| !v.is_empty()))
            .map(str::to_string);
        let user_agent = user_agent
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Self {
            ip_address,
            user_agent,
        }
    }
}

/// A persisted early-access signup.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EarlyAccessEntry {
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl EarlyAccessEntry {
    pub fn new(email: EmailAddress, client: ClientInfo, created_at: DateTime<Utc>) -> Self {
        Self {
            email: email.0,
            created_at,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalization() {
        let email = EmailAddress::parse("  A@Test.com ").unwrap();
        assert_eq!(email.as_str(), "a@test.com");
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@mail.example.org"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("plainaddress"));
        assert!(!is_valid_email("@domain.com"));
        assert!(!is_valid_email("a@domain"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@domain."));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email("a b@c.com"));
    }

    #[test]
    fn test_invalid_email_is_rejected() {
        assert!(matches!(
            EmailAddress::parse("   "),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            EmailAddress::try_from("not-an-email"),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_client_info_prefers_forwarded_for() {
        let info = ClientInfo::from_headers(
            Some("203.0.113.7, 10.0.0.1"),
            Some("10.0.0.2"),
            Some("curl/8.0"),
        );
        assert_eq!(info.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(info.user_agent.as_deref(), Some("curl/8.0"));

        let info = ClientInfo::from_headers(None, Some("10.0.0.2"), Some(""));
        assert_eq!(info.ip_address.as_deref(), Some("10.0.0.2"));
        assert_eq!(info.user_agent, None);
    }

    #[test]
    fn test_client_info_blank_forwarded_for_falls_back_to_real_ip() {
        let info = ClientInfo::from_headers(Some(""), Some("10.0.0.2"), None);
        assert_eq!(info.ip_address.as_deref(), Some("10.0.0.2"));

        let info = ClientInfo::from_headers(Some("  , 10.0.0.1"), Some(" 10.0.0.2 "), None);
        assert_eq!(info.ip_address.as_deref(), Some("10.0.0.2"));

        let info = ClientInfo::from_headers(Some(" "), Some(""), None);
        assert_eq!(info.ip_address, None);
    }

    #[test]
    fn test_entry_serialization_shape() {
        let entry = EarlyAccessEntry::new(
            EmailAddress::parse("a@test.com").unwrap(),
            ClientInfo::default(),
            Utc::now(),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["email"], "a@test.com");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("ipAddress").is_none());
    }
}
