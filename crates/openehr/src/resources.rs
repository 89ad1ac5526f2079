//! Per-resource base queries.
//!
//! A connector is parameterised by a [`ResourceQuery`], which supplies the AQL selecting every
//! record of one resource type. Filters from [`crate::filters`] are appended to it, so each
//! base query must:
//! - bind the aliases `e` (EHR), `a` (COMPOSITION) and `b_a` (entry), and
//! - end in a `where` clause, since filters start with ` and `.

use crate::aql::Aql;
use crate::{OpenEhrError, OpenEhrResult};

/// Supplies the base AQL for one resource type.
pub trait ResourceQuery: Send + Sync {
    /// Short name of the resource, used in logs.
    fn resource_type(&self) -> &str;

    /// The AQL selecting every record of this resource type.
    fn base_query(&self) -> Aql;
}

impl<T: ResourceQuery + ?Sized> ResourceQuery for Box<T> {
    fn resource_type(&self) -> &str {
        (**self).resource_type()
    }

    fn base_query(&self) -> Aql {
        (**self).base_query()
    }
}

const ALLERGY_INTOLERANCE_AQL: &str = "select \
    e/ehr_id/value as ehrId, \
    e/ehr_status/subject/external_ref/id/value as subjectId, \
    e/ehr_status/subject/external_ref/namespace as subjectNamespace, \
    a/uid/value as compositionId, \
    a/context/start_time/value as compositionStartTime, \
    a/composer/name as composerName, \
    a/composer/external_ref/id/value as composerId, \
    b_a/uid/value as entryId, \
    b_a/data[at0001]/items[at0002]/value/value as Causative_agent_value, \
    b_a/data[at0001]/items[at0002]/value/defining_code/code_string as Causative_agent_code, \
    b_a/data[at0001]/items[at0002]/value/defining_code/terminology_id/value as Causative_agent_terminology, \
    b_a/data[at0001]/items[at0063]/value/defining_code/code_string as Status_code, \
    b_a/data[at0001]/items[at0101]/value/defining_code/code_string as Criticality_code, \
    b_a/data[at0001]/items[at0120]/value/defining_code/code_string as Category_code, \
    b_a/data[at0001]/items[at0117]/value/value as Onset_of_last_reaction, \
    b_a/data[at0001]/items[at0058]/value/defining_code/code_string as Reaction_mechanism_code, \
    b_a/data[at0001]/items[at0006]/value/value as Comment, \
    b_a/protocol[at0042]/items[at0062]/value/value as AdverseReactionRiskLastUpdated, \
    b_a/data[at0001]/items[at0009]/items[at0010]/value/value as Specific_substance_value, \
    b_a/data[at0001]/items[at0009]/items[at0010]/value/defining_code/code_string as Specific_substance_code, \
    b_a/data[at0001]/items[at0009]/items[at0010]/value/defining_code/terminology_id/value as Specific_substance_terminology, \
    b_a/data[at0001]/items[at0009]/items[at0011]/value/value as Manifestation_value, \
    b_a/data[at0001]/items[at0009]/items[at0011]/value/defining_code/code_string as Manifestation_code, \
    b_a/data[at0001]/items[at0009]/items[at0011]/value/defining_code/terminology_id/value as Manifestation_terminology, \
    b_a/data[at0001]/items[at0009]/items[at0012]/value/value as Reaction_description, \
    b_a/data[at0001]/items[at0009]/items[at0027]/value/value as Onset_of_reaction, \
    b_a/data[at0001]/items[at0009]/items[at0089]/value/defining_code/code_string as Severity_code, \
    b_a/data[at0001]/items[at0009]/items[at0032]/value/value as Exposure_comment \
    from EHR e \
    contains COMPOSITION a[openEHR-EHR-COMPOSITION.adverse_reaction_list.v1] \
    contains EVALUATION b_a[openEHR-EHR-EVALUATION.adverse_reaction_risk.v1] \
    where a/name/value='Adverse reaction list'";

const CONDITION_AQL: &str = "select \
    e/ehr_id/value as ehrId, \
    e/ehr_status/subject/external_ref/id/value as subjectId, \
    e/ehr_status/subject/external_ref/namespace as subjectNamespace, \
    a/uid/value as compositionId, \
    a/context/start_time/value as compositionStartTime, \
    a/composer/name as composerName, \
    a/composer/external_ref/id/value as composerId, \
    b_a/uid/value as entryId, \
    b_a/data[at0001]/items[at0002]/value/value as Problem_Diagnosis_value, \
    b_a/data[at0001]/items[at0002]/value/defining_code/code_string as Problem_Diagnosis_code, \
    b_a/data[at0001]/items[at0002]/value/defining_code/terminology_id/value as Problem_Diagnosis_terminology, \
    b_a/data[at0001]/items[at0009]/value/value as Clinical_description, \
    b_a/data[at0001]/items[at0012]/value/value as Body_site, \
    b_a/data[at0001]/items[at0077]/value/value as Date_time_of_onset, \
    b_a/data[at0001]/items[at0030]/value/value as Date_time_of_resolution, \
    b_a/data[at0001]/items[at0005]/value/defining_code/code_string as Severity_code, \
    b_a/data[at0001]/items[at0069]/value/value as Comment, \
    b_a/protocol[at0032]/items[at0070]/value/value as Last_updated \
    from EHR e \
    contains COMPOSITION a[openEHR-EHR-COMPOSITION.problem_list.v1] \
    contains EVALUATION b_a[openEHR-EHR-EVALUATION.problem_diagnosis.v1] \
    where a/name/value='Problem list'";

/// Adverse reaction risks recorded on the adverse reaction list.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllergyIntoleranceQuery;

impl ResourceQuery for AllergyIntoleranceQuery {
    fn resource_type(&self) -> &str {
        "AllergyIntolerance"
    }

    fn base_query(&self) -> Aql {
        Aql::new(ALLERGY_INTOLERANCE_AQL)
    }
}

/// Problems and diagnoses recorded on the problem list.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConditionQuery;

impl ResourceQuery for ConditionQuery {
    fn resource_type(&self) -> &str {
        "Condition"
    }

    fn base_query(&self) -> Aql {
        Aql::new(CONDITION_AQL)
    }
}

/// A base query supplied at runtime, for resource types without a built-in mapping.
#[derive(Clone, Debug)]
pub struct CustomResourceQuery {
    resource_type: String,
    aql: String,
}

impl CustomResourceQuery {
    /// Create a custom resource query.
    ///
    /// # Errors
    ///
    /// Returns `OpenEhrError::InvalidInput` if the resource type is blank or the AQL has no
    /// `where` clause for filters to extend.
    pub fn new(resource_type: impl Into<String>, aql: impl Into<String>) -> OpenEhrResult<Self> {
        let resource_type = resource_type.into();
        let aql = aql.into();

        if resource_type.trim().is_empty() {
            return Err(OpenEhrError::InvalidInput(
                "resource type cannot be empty".into(),
            ));
        }

        let has_where = aql
            .split_whitespace()
            .any(|word| word.eq_ignore_ascii_case("where"));
        if !has_where {
            return Err(OpenEhrError::InvalidInput(
                "base query must contain a where clause".into(),
            ));
        }

        Ok(Self {
            resource_type,
            aql: aql.trim().to_owned(),
        })
    }
}

impl ResourceQuery for CustomResourceQuery {
    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn base_query(&self) -> Aql {
        Aql::new(self.aql.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_filterable(query: &dyn ResourceQuery) {
        let aql = query.base_query();
        let text = aql.as_str();
        assert!(text.starts_with("select "), "{}", query.resource_type());
        assert!(text.contains("from EHR e "));
        assert!(text.contains(" contains COMPOSITION a["));
        assert!(text.contains(" b_a[openEHR-EHR-"));
        assert!(text.contains(" where "));
        assert!(!text.contains('$'));
        assert!(!text.contains("  "));
    }

    #[test]
    fn test_builtin_queries_bind_filter_aliases() {
        assert_filterable(&AllergyIntoleranceQuery);
        assert_filterable(&ConditionQuery);
    }

    #[test]
    fn test_builtin_resource_types() {
        assert_eq!(AllergyIntoleranceQuery.resource_type(), "AllergyIntolerance");
        assert_eq!(ConditionQuery.resource_type(), "Condition");
    }

    #[test]
    fn test_custom_query_requires_where_clause() {
        let err =
            CustomResourceQuery::new("Observation", "select a from EHR e contains COMPOSITION a")
                .expect_err("should reject query without where");
        assert!(matches!(err, OpenEhrError::InvalidInput(msg) if msg.contains("where")));
    }

    #[test]
    fn test_custom_query_rejects_blank_resource_type() {
        let err = CustomResourceQuery::new(" ", "select a from EHR e where 1=1")
            .expect_err("should reject blank resource type");
        assert!(matches!(err, OpenEhrError::InvalidInput(msg) if msg.contains("resource type")));
    }

    #[test]
    fn test_custom_query_returns_trimmed_text() {
        let query = CustomResourceQuery::new(
            "Observation",
            "  select a/uid/value from EHR e contains COMPOSITION a WHERE a/name/value='Vitals'\n",
        )
        .expect("valid custom query");
        assert_eq!(query.resource_type(), "Observation");
        assert_eq!(
            query.base_query().as_str(),
            "select a/uid/value from EHR e contains COMPOSITION a WHERE a/name/value='Vitals'"
        );
    }
}
