//! Constants used when building AQL.

/// Separates the composition identifier from the optional entry identifier in a composite id.
pub const COMPOSITE_ID_DELIMITER: char = '|';

/// FHIR coding system URI for NHS numbers.
pub const NHS_NUMBER_SYSTEM: &str = "https://fhir.nhs.uk/Id/nhs-number";

/// `subject.external_ref.namespace` under which the CDR stores NHS numbers.
pub const NHS_NUMBER_NAMESPACE: &str = "uk.nhs.nhs_number";

/// strftime pattern for timestamps bound into AQL: minute precision, UTC, literal `Z`.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%dT%H:%MZ";
