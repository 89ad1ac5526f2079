//! # CDR Core
//!
//! Client for querying an openEHR Clinical Data Repository (CDR) with AQL.
//!
//! This crate covers:
//! - Connection configuration resolved once at startup ([`CdrConfig`])
//! - Basic-Auth headers, or a session opened and closed around every query ([`session`])
//! - Posting AQL to the query endpoint and unwrapping `resultSet` ([`executor`])
//! - Resource lookups by composite id, by patient, or by period ([`OpenEhrConnector`])
//!
//! **No query text is built here**: AQL templates, escaping and filter clauses belong in the
//! `openehr` crate.

pub mod config;
pub mod connector;
pub mod constants;
pub mod error;
pub mod executor;
pub mod session;

pub use config::{AuthMode, CdrConfig};
pub use connector::OpenEhrConnector;
pub use error::{ConnectorError, ConnectorResult};
pub use executor::{QueryExecutor, QueryOutcome};
pub use session::{AuthContext, SessionManager, SessionToken};
