//! Authentication and CDR session lifecycle.
//!
//! In basic-auth mode every query carries a static `Authorization: Basic` header derived from
//! the configured credentials.
//!
//! In token-auth mode every query runs inside its own session:
//! 1. `POST /rest/v1/session?username=..&password=..` returns a `sessionId`.
//! 2. The query is sent with an `Ehr-Session: <sessionId>` header.
//! 3. `DELETE /rest/v1/session` with the same header closes the session, whatever the query's
//!    outcome.
//!
//! Tokens are never cached or reused across queries. Failures while closing a session are
//! logged and discarded so they cannot mask the query result.

use crate::config::{AuthMode, CdrConfig};
use crate::constants::{
    EHR_SESSION_HEADER, SESSION_ACTION_FIELD, SESSION_DELETED_ACTION, SESSION_ID_FIELD,
    SESSION_PATH,
};
use crate::{ConnectorError, ConnectorResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::sync::Arc;

/// A session token issued by the CDR.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Credentials attached to a single query.
#[derive(Clone)]
pub enum AuthContext {
    /// Full `Authorization` header value, e.g. `Basic dXNlcjpwYXNz`.
    Basic(String),
    /// An open session that must be released after the query.
    Session(SessionToken),
}

impl AuthContext {
    /// Request headers for a JSON call authenticated with this context.
    ///
    /// # Errors
    ///
    /// Returns `ConnectorError::InvalidHeader` if the credential cannot be carried in an HTTP
    /// header (for example a token containing a newline).
    pub fn headers(&self) -> ConnectorResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        match self {
            Self::Basic(value) => {
                let value = HeaderValue::from_str(value).map_err(|_| {
                    ConnectorError::InvalidHeader("credentials are not a valid header".into())
                })?;
                headers.insert(AUTHORIZATION, value);
            }
            Self::Session(token) => {
                let value = HeaderValue::from_str(token.as_str()).map_err(|_| {
                    ConnectorError::InvalidHeader("session token is not a valid header".into())
                })?;
                headers.insert(EHR_SESSION_HEADER, value);
            }
        }

        Ok(headers)
    }

    pub fn session(&self) -> Option<&SessionToken> {
        match self {
            Self::Basic(_) => None,
            Self::Session(token) => Some(token),
        }
    }
}

/// Encode `username:password` per the HTTP Basic scheme.
pub fn basic_auth_header(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", username, password))
    )
}

/// Opens and closes CDR sessions, or builds Basic-Auth credentials, per query.
#[derive(Clone)]
pub struct SessionManager {
    http: reqwest::Client,
    config: Arc<CdrConfig>,
}

impl SessionManager {
    pub fn new(http: reqwest::Client, config: Arc<CdrConfig>) -> Self {
        Self { http, config }
    }

    /// Obtain credentials for one query, opening a session in token-auth mode.
    ///
    /// Every `AuthContext` returned here must be passed to [`SessionManager::release`] once
    /// the query has returned.
    pub async fn authorize(&self) -> ConnectorResult<AuthContext> {
        match self.config.auth_mode() {
            AuthMode::Basic => Ok(AuthContext::Basic(basic_auth_header(
                self.config.username(),
                self.config.password(),
            ))),
            AuthMode::Token => self.open().await.map(AuthContext::Session),
        }
    }

    /// Release credentials obtained from [`SessionManager::authorize`].
    ///
    /// Closes the session in token-auth mode; does nothing for Basic-Auth.
    pub async fn release(&self, auth: &AuthContext) {
        if let Some(token) = auth.session() {
            self.close(token).await;
        }
    }

    /// Open a new session.
    ///
    /// # Errors
    ///
    /// - `ConnectorError::Communication` if the CDR cannot be reached.
    /// - `ConnectorError::SessionRejected` if the CDR answers with a non-success status.
    /// - `ConnectorError::Parse` if the response body is not JSON.
    /// - `ConnectorError::MissingSessionId` if the body has no string `sessionId`.
    pub async fn open(&self) -> ConnectorResult<SessionToken> {
        let response = self
            .http
            .post(self.config.endpoint(SESSION_PATH))
            .query(&[
                ("username", self.config.username()),
                ("password", self.config.password()),
            ])
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(ConnectorError::Communication)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::SessionRejected {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(ConnectorError::Communication)?;
        let json: Value = serde_json::from_str(&body).map_err(ConnectorError::Parse)?;
        let session_id = json
            .get(SESSION_ID_FIELD)
            .and_then(Value::as_str)
            .ok_or(ConnectorError::MissingSessionId)?;

        tracing::debug!("opened CDR session");
        Ok(SessionToken::new(session_id))
    }

    /// Close a session. Failures are logged, never returned.
    pub async fn close(&self, token: &SessionToken) {
        match self.try_close(token).await {
            Ok(Some(action)) if action == SESSION_DELETED_ACTION => {
                tracing::debug!("closed CDR session");
            }
            Ok(action) => {
                tracing::warn!(
                    "CDR session close returned unexpected action: {:?}",
                    action
                );
            }
            Err(e) => {
                tracing::warn!("failed to close CDR session: {}", e);
            }
        }
    }

    async fn try_close(&self, token: &SessionToken) -> ConnectorResult<Option<String>> {
        let headers = AuthContext::Session(token.clone()).headers()?;
        let response = self
            .http
            .delete(self.config.endpoint(SESSION_PATH))
            .headers(headers)
            .send()
            .await
            .map_err(ConnectorError::Communication)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::SessionRejected {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(ConnectorError::Communication)?;
        let json: Value = serde_json::from_str(&body).map_err(ConnectorError::Parse)?;

        Ok(json
            .get(SESSION_ACTION_FIELD)
            .and_then(Value::as_str)
            .map(str::to_owned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_header_encodes_credentials() {
        assert_eq!(basic_auth_header("user", "pass"), "Basic dXNlcjpwYXNz");
        assert_eq!(
            basic_auth_header("Aladdin", "open sesame"),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn test_basic_context_headers() {
        let headers = AuthContext::Basic(basic_auth_header("user", "pass"))
            .headers()
            .expect("valid headers");
        assert_eq!(headers[AUTHORIZATION], "Basic dXNlcjpwYXNz");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert!(headers.get(EHR_SESSION_HEADER).is_none());
    }

    #[test]
    fn test_session_context_headers() {
        let context = AuthContext::Session(SessionToken::new("abc-123"));
        let headers = context.headers().expect("valid headers");
        assert_eq!(headers[EHR_SESSION_HEADER], "abc-123");
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(context.session().map(SessionToken::as_str), Some("abc-123"));
    }

    #[test]
    fn test_session_context_rejects_unencodable_token() {
        let err = AuthContext::Session(SessionToken::new("bad\ntoken"))
            .headers()
            .expect_err("should reject newline in token");
        assert!(matches!(err, ConnectorError::InvalidHeader(_)));
    }

    #[test]
    fn test_session_token_debug_is_redacted() {
        let rendered = format!("{:?}", SessionToken::new("secret-token"));
        assert!(!rendered.contains("secret-token"));
    }
}
