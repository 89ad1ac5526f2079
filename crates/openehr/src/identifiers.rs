//! Typed identifiers accepted by resource lookups.

use crate::constants::{COMPOSITE_ID_DELIMITER, NHS_NUMBER_NAMESPACE, NHS_NUMBER_SYSTEM};
use crate::validation::{validate_identifier_token, validate_literal_value};
use crate::{OpenEhrError, OpenEhrResult};
use std::fmt;
use std::str::FromStr;

/// A resource id made of a composition identifier and an optional entry identifier.
///
/// The wire form is `<compositionId>` or `<compositionId>|<entryId>`. The composition
/// identifier is an openEHR versioned object uid and may itself contain `::` separators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeIdentifier {
    composition_id: String,
    entry_id: Option<String>,
}

impl CompositeIdentifier {
    /// Parse a composite identifier.
    ///
    /// A trailing empty entry segment (`"abc|"`) is treated as no entry identifier.
    ///
    /// # Errors
    ///
    /// Returns `OpenEhrError::MalformedIdentifier` if the input is empty or too long, contains
    /// whitespace or control characters, has an empty composition segment, or has more than
    /// two segments.
    pub fn parse(input: &str) -> OpenEhrResult<Self> {
        validate_identifier_token(input)?;

        let mut segments = input.split(COMPOSITE_ID_DELIMITER);
        let composition_id = segments.next().unwrap_or_default();
        let entry_id = segments.next().filter(|s| !s.is_empty());

        if segments.next().is_some() {
            return Err(OpenEhrError::MalformedIdentifier(format!(
                "expected at most two '{}'-separated segments",
                COMPOSITE_ID_DELIMITER
            )));
        }

        if composition_id.is_empty() {
            return Err(OpenEhrError::MalformedIdentifier(
                "composition identifier cannot be empty".into(),
            ));
        }

        Ok(Self {
            composition_id: composition_id.to_owned(),
            entry_id: entry_id.map(str::to_owned),
        })
    }

    pub fn composition_id(&self) -> &str {
        &self.composition_id
    }

    pub fn entry_id(&self) -> Option<&str> {
        self.entry_id.as_deref()
    }
}

impl FromStr for CompositeIdentifier {
    type Err = OpenEhrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CompositeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entry_id {
            Some(entry_id) => write!(
                f,
                "{}{}{}",
                self.composition_id, COMPOSITE_ID_DELIMITER, entry_id
            ),
            None => f.write_str(&self.composition_id),
        }
    }
}

/// How a patient is identified in a patient-scoped search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatientIdentifier {
    /// A coded identifier matched against `ehr_status/subject/external_ref`.
    Coded { system: String, value: String },
    /// The CDR's own EHR id.
    Local(String),
}

impl PatientIdentifier {
    pub fn coded(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Coded {
            system: system.into(),
            value: value.into(),
        }
    }

    pub fn local(value: impl Into<String>) -> Self {
        Self::Local(value.into())
    }

    /// The identifier value, without its system.
    pub fn value(&self) -> &str {
        match self {
            Self::Coded { value, .. } => value,
            Self::Local(value) => value,
        }
    }

    /// Check that the identifier can be bound into a patient filter.
    ///
    /// # Errors
    ///
    /// Returns `OpenEhrError::MalformedIdentifier` if the value is blank, or if the value or a
    /// coded system is too long or contains control characters.
    pub fn validate(&self) -> OpenEhrResult<()> {
        if self.value().trim().is_empty() {
            return Err(OpenEhrError::MalformedIdentifier(
                "patient identifier value cannot be empty".into(),
            ));
        }

        validate_literal_value(self.value()).map_err(malformed_patient_identifier)?;
        if let Self::Coded { system, .. } = self {
            validate_literal_value(system).map_err(malformed_patient_identifier)?;
        }
        Ok(())
    }
}

fn malformed_patient_identifier(err: OpenEhrError) -> OpenEhrError {
    match err {
        OpenEhrError::InvalidInput(msg) => {
            OpenEhrError::MalformedIdentifier(format!("patient identifier: {}", msg))
        }
        other => other,
    }
}

/// Map a FHIR identifier system onto the namespace stored in the CDR.
///
/// An empty system or the NHS number system URI become [`NHS_NUMBER_NAMESPACE`]; any other
/// system is used verbatim.
pub fn normalise_namespace(system: &str) -> &str {
    if system.is_empty() || system == NHS_NUMBER_SYSTEM {
        NHS_NUMBER_NAMESPACE
    } else {
        system
    }
}
