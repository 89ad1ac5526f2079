//! AQL filter clauses.
//!
//! Each function returns a clause beginning with ` and ` that is appended to a resource's base
//! query (see [`crate::ResourceQuery`]). The clauses rely on the aliases every base query
//! declares: `e` for the EHR, `a` for the COMPOSITION and `b_a` for the entry.

use crate::aql::{Aql, AqlTemplate};
use crate::date::iso_date;
use crate::identifiers::{normalise_namespace, CompositeIdentifier, PatientIdentifier};
use crate::{OpenEhrError, OpenEhrResult};
use chrono::{DateTime, Utc};

const COMPOSITION_UID_FILTER: &str = " and a/uid/value=$composition_id";
const ENTRY_UID_FILTER: &str = " and b_a/uid/value=$entry_id";
const SUBJECT_EXTERNAL_REF_FILTER: &str = " and e/ehr_status/subject/external_ref/id/value=$value \
     and e/ehr_status/subject/external_ref/namespace=$namespace";
const EHR_ID_FILTER: &str = " and e/ehr_id/value=$ehr_id";
const START_TIME_RANGE_FILTER: &str =
    " and a/context/start_time/value>=$from and a/context/start_time/value<=$to";

/// Constrain the composition uid and, when present, the entry uid.
pub fn composite_identifier_filter(id: &CompositeIdentifier) -> OpenEhrResult<Aql> {
    let mut filter = AqlTemplate::new(COMPOSITION_UID_FILTER)
        .bind("composition_id", id.composition_id())
        .render()?;

    if let Some(entry_id) = id.entry_id() {
        filter = filter.and(
            AqlTemplate::new(ENTRY_UID_FILTER)
                .bind("entry_id", entry_id)
                .render()?,
        );
    }

    Ok(filter)
}

/// Constrain the EHR subject's external reference to `(system, value)`.
///
/// `system` is normalised with [`normalise_namespace`].
pub fn coded_patient_identifier_filter(system: &str, value: &str) -> OpenEhrResult<Aql> {
    AqlTemplate::new(SUBJECT_EXTERNAL_REF_FILTER)
        .bind("value", value)
        .bind("namespace", normalise_namespace(system))
        .render()
}

/// Constrain the CDR's own EHR id.
pub fn local_patient_id_filter(value: &str) -> OpenEhrResult<Aql> {
    AqlTemplate::new(EHR_ID_FILTER).bind("ehr_id", value).render()
}

/// Dispatch on the kind of patient identifier.
pub fn patient_identifier_filter(patient: &PatientIdentifier) -> OpenEhrResult<Aql> {
    match patient {
        PatientIdentifier::Coded { system, value } => {
            coded_patient_identifier_filter(system, value)
        }
        PatientIdentifier::Local(value) => local_patient_id_filter(value),
    }
}

/// Constrain the composition start time to the inclusive range `[from, to]`.
///
/// # Errors
///
/// Returns `OpenEhrError::InvalidInput` if `from` is after `to`.
pub fn start_time_range_filter(from: DateTime<Utc>, to: DateTime<Utc>) -> OpenEhrResult<Aql> {
    if from > to {
        return Err(OpenEhrError::InvalidInput(
            "start of period must not be after its end".into(),
        ));
    }

    AqlTemplate::new(START_TIME_RANGE_FILTER)
        .bind("from", iso_date(from))
        .bind("to", iso_date(to))
        .render()
}
