//! openEHR query support.
//!
//! This crate builds AQL (Archetype Query Language) text for an openEHR Clinical Data
//! Repository (CDR). It has no transport concerns: sending queries, authentication and session
//! handling live in `cdr-core`.
//!
//! Caller-supplied values only reach query text through [`AqlTemplate`], which binds named
//! placeholders as escaped string literals.

pub mod aql;
pub mod constants;
pub mod date;
pub mod filters;
pub mod identifiers;
pub mod resources;
pub mod validation;

use thiserror::Error;

pub use aql::{escape_literal, Aql, AqlTemplate};
pub use date::iso_date;
pub use identifiers::{normalise_namespace, CompositeIdentifier, PatientIdentifier};
pub use resources::{AllergyIntoleranceQuery, ConditionQuery, CustomResourceQuery, ResourceQuery};

/// Errors returned by the `openehr` query crate.
#[derive(Debug, Error)]
pub enum OpenEhrError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed identifier: {0}")]
    MalformedIdentifier(String),

    #[error("no value bound for AQL parameter '{0}'")]
    UnboundParameter(String),

    #[error("invalid AQL placeholder: {0}")]
    InvalidPlaceholder(String),
}

pub type OpenEhrResult<T> = std::result::Result<T, OpenEhrError>;
