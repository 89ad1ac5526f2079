//! AQL execution against the CDR query endpoint.

use crate::config::CdrConfig;
use crate::constants::{QUERY_PATH, RESULT_SET_FIELD};
use crate::session::{AuthContext, SessionManager};
use crate::{ConnectorError, ConnectorResult};
use openehr::Aql;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Outcome of a query the CDR answered.
///
/// Transport failures are errors; everything the CDR actually replied with is an outcome, so
/// callers can tell "no data" apart from "the CDR refused the query".
#[derive(Clone, Debug, PartialEq)]
pub enum QueryOutcome {
    /// HTTP 200 with a `resultSet` field, returned verbatim.
    ResultSet(Value),
    /// HTTP 200 without a `resultSet` field.
    Empty,
    /// Any status other than 200.
    Rejected { status: u16 },
}

impl QueryOutcome {
    /// Collapse to the result set, treating `Empty` and `Rejected` as no result.
    pub fn into_result_set(self) -> Option<Value> {
        match self {
            Self::ResultSet(value) => Some(value),
            Self::Empty | Self::Rejected { .. } => None,
        }
    }
}

#[derive(Serialize)]
struct AqlRequest<'a> {
    aql: &'a str,
}

/// Sends AQL to the CDR, wrapping each call in the configured authentication.
///
/// Each execution runs strictly in sequence: session open (token mode), query, session close
/// (token mode). Nothing is shared between executions except the HTTP connection pool.
#[derive(Clone)]
pub struct QueryExecutor {
    http: reqwest::Client,
    config: Arc<CdrConfig>,
    sessions: SessionManager,
}

impl QueryExecutor {
    pub fn new(config: CdrConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create an executor that sends requests through an existing client.
    pub fn with_client(http: reqwest::Client, config: CdrConfig) -> Self {
        let config = Arc::new(config);
        Self {
            sessions: SessionManager::new(http.clone(), config.clone()),
            http,
            config,
        }
    }

    pub fn config(&self) -> &CdrConfig {
        &self.config
    }

    /// Run a query and return its result set, or `None` if the CDR returned no result set or
    /// a non-200 status.
    ///
    /// # Errors
    ///
    /// Returns `ConnectorError::Communication` for transport failures, and the session errors
    /// of [`SessionManager::open`] in token-auth mode.
    pub async fn execute(&self, aql: &Aql) -> ConnectorResult<Option<Value>> {
        Ok(self.execute_outcome(aql).await?.into_result_set())
    }

    /// Run a query and report exactly what the CDR answered.
    pub async fn execute_outcome(&self, aql: &Aql) -> ConnectorResult<QueryOutcome> {
        let auth = self.sessions.authorize().await?;

        tracing::debug!("AQL: {}", aql);
        let response = self.post_query(&auth, aql).await;
        self.sessions.release(&auth).await;
        let (status, body) = response?;

        if status != StatusCode::OK {
            tracing::warn!("CDR query returned HTTP {}", status.as_u16());
            return Ok(QueryOutcome::Rejected {
                status: status.as_u16(),
            });
        }

        let json: Value = serde_json::from_str(&body).map_err(ConnectorError::Parse)?;
        match json {
            Value::Object(mut fields) => Ok(fields
                .remove(RESULT_SET_FIELD)
                .map_or(QueryOutcome::Empty, QueryOutcome::ResultSet)),
            _ => Ok(QueryOutcome::Empty),
        }
    }

    async fn post_query(
        &self,
        auth: &AuthContext,
        aql: &Aql,
    ) -> ConnectorResult<(StatusCode, String)> {
        let response = self
            .http
            .post(self.config.endpoint(QUERY_PATH))
            .headers(auth.headers()?)
            .json(&AqlRequest { aql: aql.as_str() })
            .send()
            .await
            .map_err(ConnectorError::Communication)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(ConnectorError::Communication)?;
        Ok((status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_result_set() {
        let rows = json!([{ "compositionId": "abc" }]);
        assert_eq!(
            QueryOutcome::ResultSet(rows.clone()).into_result_set(),
            Some(rows)
        );
        assert_eq!(QueryOutcome::Empty.into_result_set(), None);
        assert_eq!(
            QueryOutcome::Rejected { status: 500 }.into_result_set(),
            None
        );
    }

    #[test]
    fn test_request_body_escapes_aql_as_json() {
        let aql = Aql::new(r#"select a from EHR e where a/name/value="x""#);
        let body = serde_json::to_value(AqlRequest { aql: aql.as_str() }).unwrap();
        assert_eq!(body, json!({ "aql": r#"select a from EHR e where a/name/value="x""# }));
    }
}
