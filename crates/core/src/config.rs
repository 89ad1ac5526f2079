//! Connector runtime configuration.
//!
//! This module defines configuration that is resolved once at process startup and then passed
//! into the connector. The connector never reads environment variables itself; the helpers
//! below take values the binary has already read, so they can be exercised in tests without
//! touching process-wide state.

use crate::{ConnectorError, ConnectorResult};
use std::fmt;

/// How requests to the CDR are authenticated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthMode {
    /// Static `Authorization: Basic` header on every request.
    #[default]
    Basic,
    /// A session opened before and closed after every query.
    Token,
}

/// Connection settings for one CDR.
///
/// Immutable once constructed. The password is never included in `Debug` output.
#[derive(Clone)]
pub struct CdrConfig {
    base_url: String,
    username: String,
    password: String,
    auth_mode: AuthMode,
}

impl CdrConfig {
    /// Create a new `CdrConfig`.
    ///
    /// A trailing `/` on `base_url` is removed so endpoint paths can be appended directly.
    ///
    /// # Errors
    ///
    /// Returns `ConnectorError::InvalidConfig` if `base_url` is not an absolute `http` or
    /// `https` URL, or if `username` is blank.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        auth_mode: AuthMode,
    ) -> ConnectorResult<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        let username = username.into();

        let parsed = reqwest::Url::parse(&base_url).map_err(|e| {
            ConnectorError::InvalidConfig(format!("CDR url '{}' is not valid: {}", base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConnectorError::InvalidConfig(format!(
                "CDR url must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        if username.trim().is_empty() {
            return Err(ConnectorError::InvalidConfig(
                "CDR username cannot be empty".into(),
            ));
        }

        Ok(Self {
            base_url,
            username,
            password: password.into(),
            auth_mode,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    pub fn is_token_auth(&self) -> bool {
        self.auth_mode == AuthMode::Token
    }

    /// Absolute URL of a CDR endpoint.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl fmt::Debug for CdrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdrConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_mode", &self.auth_mode)
            .finish()
    }
}

/// Parse the token-auth flag from an optional string value.
///
/// If `value` is `None` or empty/whitespace, basic authentication is selected. Accepts
/// `true`/`false`, `1`/`0` and `yes`/`no`, case-insensitively.
pub fn auth_mode_from_env_value(value: Option<String>) -> ConnectorResult<AuthMode> {
    let value = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    match value.as_deref() {
        None | Some("false" | "0" | "no") => Ok(AuthMode::Basic),
        Some("true" | "1" | "yes") => Ok(AuthMode::Token),
        Some(other) => Err(ConnectorError::InvalidConfig(format!(
            "token auth flag must be true or false, got '{}'",
            other
        ))),
    }
}

/// Require a configuration value to be present.
///
/// `name` is only used in the error message.
pub fn required_env_value(name: &str, value: Option<String>) -> ConnectorResult<String> {
    value.ok_or_else(|| ConnectorError::InvalidConfig(format!("{} must be set", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = CdrConfig::new("https://cdr.example.org/ehr/", "user", "pass", AuthMode::Basic)
            .expect("valid config");
        assert_eq!(config.base_url(), "https://cdr.example.org/ehr");
        assert_eq!(
            config.endpoint("/rest/v1/query"),
            "https://cdr.example.org/ehr/rest/v1/query"
        );
    }

    #[test]
    fn test_new_rejects_invalid_urls() {
        for url in ["", "not a url", "ftp://cdr.example.org"] {
            let err = CdrConfig::new(url, "user", "pass", AuthMode::Basic)
                .expect_err("should reject url");
            assert!(matches!(err, ConnectorError::InvalidConfig(_)), "{url}");
        }
    }

    #[test]
    fn test_new_rejects_blank_username() {
        let err = CdrConfig::new("http://localhost:8080", " ", "pass", AuthMode::Token)
            .expect_err("should reject blank username");
        assert!(matches!(err, ConnectorError::InvalidConfig(msg) if msg.contains("username")));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = CdrConfig::new("http://localhost:8080", "user", "s3cret", AuthMode::Token)
            .expect("valid config");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
        assert!(config.is_token_auth());
    }

    #[test]
    fn test_auth_mode_from_env_value() {
        assert_eq!(auth_mode_from_env_value(None).unwrap(), AuthMode::Basic);
        assert_eq!(auth_mode_from_env_value(Some("  ".into())).unwrap(), AuthMode::Basic);
        assert_eq!(auth_mode_from_env_value(Some("FALSE".into())).unwrap(), AuthMode::Basic);
        assert_eq!(auth_mode_from_env_value(Some("true".into())).unwrap(), AuthMode::Token);
        assert_eq!(auth_mode_from_env_value(Some(" Yes ".into())).unwrap(), AuthMode::Token);
        assert_eq!(auth_mode_from_env_value(Some("1".into())).unwrap(), AuthMode::Token);

        let err = auth_mode_from_env_value(Some("sometimes".into()))
            .expect_err("should reject unknown flag");
        assert!(matches!(err, ConnectorError::InvalidConfig(msg) if msg.contains("sometimes")));
    }

    #[test]
    fn test_required_env_value() {
        assert_eq!(
            required_env_value("CDR_CONNECTOR_URL", Some("x".into())).unwrap(),
            "x"
        );
        let err = required_env_value("CDR_CONNECTOR_URL", None).expect_err("should require value");
        assert!(matches!(err, ConnectorError::InvalidConfig(msg) if msg.contains("CDR_CONNECTOR_URL")));
    }
}
