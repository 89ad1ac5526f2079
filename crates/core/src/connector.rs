//! Resource lookups against an openEHR CDR.
//!
//! An [`OpenEhrConnector`] pairs a [`ResourceQuery`] (the base AQL for one resource type) with
//! a [`QueryExecutor`]. Each lookup builds a fresh query from the base AQL plus filters, runs
//! it, and returns the CDR's result set verbatim.
//!
//! Malformed identifiers are not errors: the lookup returns `Ok(None)` without contacting the
//! CDR.

use crate::config::CdrConfig;
use crate::executor::QueryExecutor;
use crate::ConnectorResult;
use chrono::{DateTime, Utc};
use openehr::filters::{
    composite_identifier_filter, patient_identifier_filter, start_time_range_filter,
};
use openehr::{Aql, CompositeIdentifier, PatientIdentifier, ResourceQuery};
use serde_json::Value;

/// Looks up records of one resource type in an openEHR CDR.
///
/// `R` supplies the base AQL; every lookup appends its filters to it and runs the result
/// through the connector's [`QueryExecutor`].
pub struct OpenEhrConnector<R> {
    resource: R,
    executor: QueryExecutor,
}

impl<R: ResourceQuery> OpenEhrConnector<R> {
    pub fn new(config: CdrConfig, resource: R) -> Self {
        Self::with_executor(QueryExecutor::new(config), resource)
    }

    pub fn with_executor(executor: QueryExecutor, resource: R) -> Self {
        Self { resource, executor }
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    /// The AQL selecting every record of this connector's resource type.
    pub fn base_query(&self) -> Aql {
        self.resource.base_query()
    }

    /// The AQL `get_resource_by_id` would send for `id`.
    pub fn query_for_id(&self, id: &CompositeIdentifier) -> ConnectorResult<Aql> {
        Ok(self.base_query().and(composite_identifier_filter(id)?))
    }

    /// The AQL `get_resources_for_patient` would send for `patient`.
    pub fn query_for_patient(&self, patient: &PatientIdentifier) -> ConnectorResult<Aql> {
        Ok(self.base_query().and(patient_identifier_filter(patient)?))
    }

    /// Fetch every record of this connector's resource type.
    pub async fn get_all_resources(&self) -> ConnectorResult<Option<Value>> {
        tracing::debug!("fetching all {} resources", self.resource.resource_type());
        self.executor.execute(&self.base_query()).await
    }

    /// Fetch the record identified by a composite `<compositionId>[|<entryId>]` id.
    ///
    /// Returns `Ok(None)` without contacting the CDR if `id` is malformed.
    pub async fn get_resource_by_id(&self, id: &str) -> ConnectorResult<Option<Value>> {
        let id = match CompositeIdentifier::parse(id) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!("ignoring {} lookup: {}", self.resource.resource_type(), e);
                return Ok(None);
            }
        };

        let aql = self.query_for_id(&id)?;
        self.executor.execute(&aql).await
    }

    /// Fetch every record belonging to one patient.
    ///
    /// Returns `Ok(None)` without contacting the CDR if the identifier value is blank.
    pub async fn get_resources_for_patient(
        &self,
        patient: &PatientIdentifier,
    ) -> ConnectorResult<Option<Value>> {
        if let Err(e) = patient.validate() {
            tracing::debug!("ignoring {} lookup: {}", self.resource.resource_type(), e);
            return Ok(None);
        }

        let aql = self.query_for_patient(patient)?;
        self.executor.execute(&aql).await
    }

    /// Fetch every record whose composition started within `[from, to]`.
    pub async fn get_resources_in_period(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ConnectorResult<Option<Value>> {
        let aql = self.base_query().and(start_time_range_filter(from, to)?);
        self.executor.execute(&aql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthMode;
    use openehr::{AllergyIntoleranceQuery, CustomResourceQuery};

    fn connector<R: ResourceQuery>(resource: R) -> OpenEhrConnector<R> {
        let config =
            CdrConfig::new("http://localhost:8888", "user", "pass", AuthMode::Basic).unwrap();
        OpenEhrConnector::new(config, resource)
    }

    #[test]
    fn test_query_for_id_appends_filters_to_base_query() {
        let resource =
            CustomResourceQuery::new("Test", "select a from EHR e contains COMPOSITION a where 1=1")
                .unwrap();
        let connector = connector(resource);
        let id = CompositeIdentifier::parse("abc123|entry9").unwrap();
        let aql = connector.query_for_id(&id).unwrap();
        assert_eq!(
            aql.as_str(),
            "select a from EHR e contains COMPOSITION a where 1=1 \
             and a/uid/value='abc123' and b_a/uid/value='entry9'"
        );
    }

    #[test]
    fn test_query_for_patient_uses_base_query_prefix() {
        let connector = connector(AllergyIntoleranceQuery);
        let aql = connector
            .query_for_patient(&PatientIdentifier::coded("", "9434765919"))
            .unwrap();
        assert!(aql.as_str().starts_with(connector.base_query().as_str()));
        assert!(aql
            .as_str()
            .ends_with("e/ehr_status/subject/external_ref/namespace='uk.nhs.nhs_number'"));
    }
}
