use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::EndpointConfig;
use crate::error::{ConfigurationError, FixtureError, Result, VerificationFailure};
use crate::fixtures::{FixtureLoader, TestScenario};
use crate::model::{Payload, Resource};
use crate::transport::{ApiRequest, ApiResponse, Transport};
use crate::verify::{Reporter, ResponseVerifier};

mod messages;

pub use messages::{
    invalid_id_message, problem_title, FieldErrorCatalog, FieldErrorRule, ID_ROUTE_FIELD,
    MALFORMED_ID, NOT_FOUND_TITLE, SQL_INJECTION_ID, VALIDATION_TITLE,
};

/// Runs request/verify cycles against one environment. Each `check_*` method
/// issues its own requests and returns the first failure.
pub struct TestCaseOrchestrator<'a> {
    endpoints: EndpointConfig,
    golden: FixtureLoader,
    scenarios: FixtureLoader,
    transport: &'a dyn Transport,
    reporter: &'a dyn Reporter,
}

impl<'a> TestCaseOrchestrator<'a> {
    pub fn new(
        endpoints: EndpointConfig,
        golden: FixtureLoader,
        scenarios: FixtureLoader,
        transport: &'a dyn Transport,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            endpoints,
            golden,
            scenarios,
            transport,
            reporter,
        }
    }

    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    fn environment(&self) -> &str {
        &self.endpoints.environment
    }

    fn verifier(&self) -> ResponseVerifier<'a> {
        ResponseVerifier::new(self.reporter)
    }

    pub fn collection_url<R: Resource>(&self) -> Result<String, ConfigurationError> {
        self.endpoints.endpoint_url(R::ENDPOINT)
    }

    fn item_url<R: Resource>(&self, id: &str) -> Result<String, ConfigurationError> {
        Ok(format!("{}/{}", self.collection_url::<R>()?, id))
    }

    pub fn golden_data<R: Resource>(&self) -> Result<Vec<R>, FixtureError> {
        self.golden.load(self.environment(), &R::golden_fixture())
    }

    pub fn create_scenarios<R: Resource>(
        &self,
    ) -> Result<Vec<TestScenario<R::Payload>>, FixtureError> {
        self.scenarios
            .load_scenarios(self.environment(), &R::create_scenarios_fixture())
    }

    pub fn update_scenarios<R: Resource>(
        &self,
    ) -> Result<Vec<TestScenario<R::Payload>>, FixtureError> {
        self.scenarios
            .load_scenarios(self.environment(), &R::update_scenarios_fixture())
    }

    /// The resource's default catalogue, or the environment's override when a
    /// `field_errors` fixture exists.
    pub fn field_errors<R: Resource>(&self) -> Result<FieldErrorCatalog, FixtureError> {
        let defaults = FieldErrorCatalog::defaults_for(R::ENDPOINT);
        let rules = self
            .scenarios
            .load_optional::<FieldErrorRule>(self.environment(), &R::field_errors_fixture())?;
        Ok(match rules {
            Some(rules) => defaults.with_rules(rules),
            None => defaults,
        })
    }

    /// Sends `request` and asserts the latency bound, then the status.
    async fn exchange(&self, request: ApiRequest, expected_status: u16) -> Result<ApiResponse> {
        let response = self.transport.send(request).await?;
        let verifier = self.verifier();
        verifier.assert_latency(&response, self.endpoints.max_response_time_millis)?;
        verifier.assert_status(&response, expected_status)?;
        Ok(response)
    }

    async fn list<R: Resource>(&self) -> Result<(ApiResponse, Vec<R>)> {
        let url = self.collection_url::<R>()?;
        let response = self.exchange(ApiRequest::get(url), 200).await?;
        let items: Vec<R> = self.verifier().decode(&response)?;
        debug!(count = items.len(), "listed {}s", R::LABEL);
        Ok((response, items))
    }

    async fn expect_not_found(&self, request: ApiRequest) -> Result<()> {
        let response = self.exchange(request, 404).await?;
        self.verifier()
            .assert_error_envelope(&response, NOT_FOUND_TITLE, 404)?;
        Ok(())
    }

    async fn expect_invalid_id(&self, request: ApiRequest, raw_id: &str) -> Result<()> {
        let response = self.exchange(request, 400).await?;
        let verifier = self.verifier();
        let envelope = verifier.assert_error_envelope(&response, VALIDATION_TITLE, 400)?;
        verifier.assert_field_error(&envelope, ID_ROUTE_FIELD, &invalid_id_message(raw_id))?;
        Ok(())
    }

    /// Every golden item is listed, and nothing is listed twice.
    #[instrument(skip(self), fields(resource = R::LABEL))]
    pub async fn check_list_consistency<R: Resource>(&self) -> Result<()> {
        let expected: Vec<R> = self.golden_data()?;
        let (response, actual) = self.list::<R>().await?;
        let verifier = self.verifier();
        verifier.assert_no_missing(&expected, &actual, &response)?;
        verifier.assert_no_duplicates(&actual, &response)?;
        Ok(())
    }

    #[instrument(skip(self), fields(resource = R::LABEL))]
    pub async fn check_get_existing<R: Resource>(&self) -> Result<()> {
        let golden: Vec<R> = self.golden_data()?;
        let (expected, id) = first_with_id(&golden, "golden data")?;
        let url = self.item_url::<R>(&id.to_string())?;
        let response = self.exchange(ApiRequest::get(url), 200).await?;
        self.verifier().assert_body_equals(&response, &expected)?;
        Ok(())
    }

    /// GET on an id one past the highest listed id yields `Not Found`.
    #[instrument(skip(self), fields(resource = R::LABEL))]
    pub async fn check_get_unknown<R: Resource>(&self) -> Result<()> {
        let (_, listed) = self.list::<R>().await?;
        let url = self.item_url::<R>(&next_unused_id(&listed)?.to_string())?;
        self.expect_not_found(ApiRequest::get(url)).await
    }

    /// GET with a non-numeric id is rejected by route validation.
    #[instrument(skip(self), fields(resource = R::LABEL))]
    pub async fn check_get_malformed<R: Resource>(&self, raw_id: &str) -> Result<()> {
        let url = self.item_url::<R>(raw_id)?;
        self.expect_invalid_id(ApiRequest::get(url), raw_id).await
    }

    #[instrument(skip(self, scenario, catalog), fields(resource = R::LABEL, scenario = %scenario.test_name))]
    pub async fn run_create_scenario<R: Resource>(
        &self,
        scenario: &TestScenario<R::Payload>,
        catalog: &FieldErrorCatalog,
    ) -> Result<()> {
        let url = self.collection_url::<R>()?;
        let request = ApiRequest::post(url, to_json(&scenario.payload)?);
        self.run_scenario(request, scenario, catalog).await
    }

    /// POST a golden item under a fresh id, then read it back.
    #[instrument(skip(self), fields(resource = R::LABEL))]
    pub async fn check_create_persistence<R: Resource>(&self) -> Result<()> {
        let (_, listed) = self.list::<R>().await?;
        let golden: Vec<R> = self.golden_data()?;
        let template = golden.first().ok_or_else(|| {
            VerificationFailure::Precondition(format!("golden data has no {}", R::LABEL))
        })?;

        let new_id = next_unused_id(&listed)?;
        let created = template.with_id(new_id);
        let payload = created.to_payload();

        let url = self.collection_url::<R>()?;
        let response = self
            .exchange(ApiRequest::post(url, to_json(&payload)?), 200)
            .await?;
        self.verifier().assert_body_equals(&response, &payload)?;

        let url = self.item_url::<R>(&new_id.to_string())?;
        let response = self.exchange(ApiRequest::get(url), 200).await?;
        self.verifier().assert_body_equals(&response, &created)?;
        Ok(())
    }

    /// PUT to `/{id}` where `id` is the scenario's own id, `null` when absent.
    #[instrument(skip(self, scenario, catalog), fields(resource = R::LABEL, scenario = %scenario.test_name))]
    pub async fn run_update_scenario<R: Resource>(
        &self,
        scenario: &TestScenario<R::Payload>,
        catalog: &FieldErrorCatalog,
    ) -> Result<()> {
        let id = scenario
            .payload
            .id()
            .map_or_else(|| "null".to_string(), |id| id.to_string());
        let url = self.item_url::<R>(&id)?;
        let request = ApiRequest::put(url, to_json(&scenario.payload)?);
        self.run_scenario(request, scenario, catalog).await
    }

    #[instrument(skip(self), fields(resource = R::LABEL))]
    pub async fn check_update_unknown<R: Resource>(&self) -> Result<()> {
        let golden: Vec<R> = self.golden_data()?;
        let (template, _) = first_with_id(&golden, "golden data")?;
        let (_, listed) = self.list::<R>().await?;
        let url = self.item_url::<R>(&next_unused_id(&listed)?.to_string())?;
        let body = to_json(&template.to_payload())?;
        self.expect_not_found(ApiRequest::put(url, body)).await
    }

    #[instrument(skip(self), fields(resource = R::LABEL))]
    pub async fn check_update_malformed<R: Resource>(&self, raw_id: &str) -> Result<()> {
        let golden: Vec<R> = self.golden_data()?;
        let (template, _) = first_with_id(&golden, "golden data")?;
        let url = self.item_url::<R>(raw_id)?;
        let body = to_json(&template.to_payload())?;
        self.expect_invalid_id(ApiRequest::put(url, body), raw_id).await
    }

    /// Edit the first listed item, PUT it, then read it back.
    #[instrument(skip(self), fields(resource = R::LABEL))]
    pub async fn check_update_persistence<R: Resource>(&self) -> Result<()> {
        let (_, listed) = self.list::<R>().await?;
        let (existing, id) = first_with_id(&listed, "listing")?;
        let updated = existing.edited();
        let payload = updated.to_payload();

        let url = self.item_url::<R>(&id.to_string())?;
        let response = self
            .exchange(ApiRequest::put(url.clone(), to_json(&payload)?), 200)
            .await?;
        self.verifier().assert_body_equals(&response, &payload)?;

        let response = self.exchange(ApiRequest::get(url), 200).await?;
        self.verifier().assert_body_equals(&response, &updated)?;
        Ok(())
    }

    /// DELETE the first listed item; a later GET must not find it.
    #[instrument(skip(self), fields(resource = R::LABEL))]
    pub async fn check_delete_existing<R: Resource>(&self) -> Result<()> {
        let (_, listed) = self.list::<R>().await?;
        let (_, id) = first_with_id(&listed, "listing")?;
        let url = self.item_url::<R>(&id.to_string())?;

        self.exchange(ApiRequest::delete(url.clone()), 200).await?;
        self.exchange(ApiRequest::get(url), 404).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(resource = R::LABEL))]
    pub async fn check_delete_unknown<R: Resource>(&self) -> Result<()> {
        let (_, listed) = self.list::<R>().await?;
        let url = self.item_url::<R>(&next_unused_id(&listed)?.to_string())?;
        self.expect_not_found(ApiRequest::delete(url)).await
    }

    #[instrument(skip(self), fields(resource = R::LABEL))]
    pub async fn check_delete_malformed<R: Resource>(&self, raw_id: &str) -> Result<()> {
        let url = self.item_url::<R>(raw_id)?;
        self.expect_invalid_id(ApiRequest::delete(url), raw_id).await
    }

    /// Sends a scenario's request and verifies according to its expected
    /// status: success echoes the payload, any client error carries a
    /// problem-details envelope, and 400 adds one field error per catalogued
    /// absent field.
    async fn run_scenario<P: Payload>(
        &self,
        request: ApiRequest,
        scenario: &TestScenario<P>,
        catalog: &FieldErrorCatalog,
    ) -> Result<()> {
        let expected = scenario.expected_status_code;
        let response = self.exchange(request, expected).await?;
        let verifier = self.verifier();

        match expected {
            200..=299 => {
                verifier.assert_body_equals(&response, &scenario.payload)?;
            }
            400..=499 => {
                let title = scenario
                    .expected_title
                    .as_deref()
                    .or_else(|| problem_title(expected))
                    .ok_or_else(|| {
                        VerificationFailure::Precondition(format!(
                            "scenario '{}' expects status {} but names no expectedTitle",
                            scenario.test_name, expected
                        ))
                    })?;
                let envelope = verifier.assert_error_envelope(&response, title, expected)?;
                if expected == 400 {
                    let absent = scenario.payload.absent_fields();
                    for rule in catalog.expected_for(&absent) {
                        verifier.assert_field_error(&envelope, &rule.field_path, &rule.message)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// One past the highest id in `items`, or 1 when nothing has an id.
pub fn next_unused_id<R: Resource>(items: &[R]) -> Result<i64, VerificationFailure> {
    match items.iter().filter_map(|item| item.id()).max() {
        None => Ok(1),
        Some(highest) => highest.checked_add(1).ok_or_else(|| {
            VerificationFailure::Precondition(format!(
                "listing holds a {} with id {}, no higher id is left",
                R::LABEL,
                highest
            ))
        }),
    }
}

fn first_with_id<R: Resource>(
    items: &[R],
    source: &str,
) -> Result<(R, i64), VerificationFailure> {
    items
        .iter()
        .find_map(|item| item.id().map(|id| (item.clone(), id)))
        .ok_or_else(|| {
            VerificationFailure::Precondition(format!("{} has no {} with an id", source, R::LABEL))
        })
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, VerificationFailure> {
    serde_json::to_value(value).map_err(|e| {
        VerificationFailure::Precondition(format!("request body cannot be serialized: {}", e))
    })
}
