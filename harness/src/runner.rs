use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{ConfigurationError, FixtureError, Result};
use crate::fixtures::TestScenario;
use crate::model::{Author, Book, Resource};
use crate::orchestrator::{FieldErrorCatalog, TestCaseOrchestrator, MALFORMED_ID, SQL_INJECTION_ID};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub outcomes: Vec<CheckOutcome>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: OffsetDateTime::now_utc(),
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, name: impl Into<String>, result: Result<()>) {
        let name = name.into();
        let outcome = match result {
            Ok(()) => {
                info!(check = %name, "check passed");
                CheckOutcome {
                    name,
                    passed: true,
                    kind: None,
                    error: None,
                }
            }
            Err(e) => {
                warn!(check = %name, kind = e.kind(), error = %e, "check failed");
                CheckOutcome {
                    name,
                    passed: false,
                    kind: Some(e.kind()),
                    error: Some(e.to_string()),
                }
            }
        };
        self.outcomes.push(outcome);
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, name: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// A resource whose catalogue can be run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suite {
    Books,
    Authors,
}

impl Suite {
    pub const ALL: [Suite; 2] = [Suite::Books, Suite::Authors];

    pub fn endpoint(self) -> &'static str {
        match self {
            Suite::Books => Book::ENDPOINT,
            Suite::Authors => Author::ENDPOINT,
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

// Checks run reads, creates, updates, then deletes. Only a configuration
// error stops a run, and it is raised before the first request.
pub struct SuiteRunner<'o, 'a> {
    orchestrator: &'o TestCaseOrchestrator<'a>,
}

impl<'o, 'a> SuiteRunner<'o, 'a> {
    pub fn new(orchestrator: &'o TestCaseOrchestrator<'a>) -> Self {
        Self { orchestrator }
    }

    /// Resolves every endpoint the suites touch, so a broken configuration
    /// fails before any request is sent.
    pub fn preflight(&self, suites: &[Suite]) -> Result<(), ConfigurationError> {
        for suite in suites {
            self.orchestrator.endpoints().endpoint_url(suite.endpoint())?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn run(&self, suites: &[Suite]) -> Result<RunReport, ConfigurationError> {
        self.preflight(suites)?;

        let mut report = RunReport::new();
        info!(run_id = %report.run_id, environment = %self.orchestrator.endpoints().environment, "starting run");
        for suite in suites {
            match suite {
                Suite::Books => self.run_resource::<Book>(&mut report).await,
                Suite::Authors => self.run_resource::<Author>(&mut report).await,
            }
        }
        info!(
            run_id = %report.run_id,
            passed = report.passed(),
            failed = report.failed(),
            "run finished"
        );
        Ok(report)
    }

    pub async fn run_resource<R: Resource>(&self, report: &mut RunReport) {
        let o = self.orchestrator;
        let label = R::LABEL;

        report.record(
            format!("GET {}s: list consistency", label),
            o.check_list_consistency::<R>().await,
        );
        report.record(
            format!("GET {} by id", label),
            o.check_get_existing::<R>().await,
        );
        report.record(
            format!("GET {} by unknown id", label),
            o.check_get_unknown::<R>().await,
        );
        report.record(
            format!("GET {} by malformed id", label),
            o.check_get_malformed::<R>(MALFORMED_ID).await,
        );
        report.record(
            format!("GET {} by SQL injection id", label),
            o.check_get_malformed::<R>(SQL_INJECTION_ID).await,
        );

        match self.scenario_set::<R>(o.create_scenarios::<R>()) {
            Ok((catalog, scenarios)) => {
                for scenario in &scenarios {
                    report.record(
                        format!("POST {}: {}", label, scenario.test_name),
                        o.run_create_scenario::<R>(scenario, &catalog).await,
                    );
                }
            }
            Err(e) => report.record(format!("POST {} scenarios", label), Err(e.into())),
        }
        report.record(
            format!("POST {}: persistence", label),
            o.check_create_persistence::<R>().await,
        );

        match self.scenario_set::<R>(o.update_scenarios::<R>()) {
            Ok((catalog, scenarios)) => {
                for scenario in &scenarios {
                    report.record(
                        format!("PUT {}: {}", label, scenario.test_name),
                        o.run_update_scenario::<R>(scenario, &catalog).await,
                    );
                }
            }
            Err(e) => report.record(format!("PUT {} scenarios", label), Err(e.into())),
        }
        report.record(
            format!("PUT {} with unknown id", label),
            o.check_update_unknown::<R>().await,
        );
        report.record(
            format!("PUT {} with malformed id", label),
            o.check_update_malformed::<R>(MALFORMED_ID).await,
        );
        report.record(
            format!("PUT {} with SQL injection id", label),
            o.check_update_malformed::<R>(SQL_INJECTION_ID).await,
        );
        report.record(
            format!("PUT {}: persistence", label),
            o.check_update_persistence::<R>().await,
        );

        report.record(
            format!("DELETE {} by id", label),
            o.check_delete_existing::<R>().await,
        );
        report.record(
            format!("DELETE {} with malformed id", label),
            o.check_delete_malformed::<R>(MALFORMED_ID).await,
        );
        report.record(
            format!("DELETE {} with unknown id", label),
            o.check_delete_unknown::<R>().await,
        );
        report.record(
            format!("DELETE {} with SQL injection id", label),
            o.check_delete_malformed::<R>(SQL_INJECTION_ID).await,
        );
    }

    fn scenario_set<R: Resource>(
        &self,
        scenarios: Result<Vec<TestScenario<R::Payload>>, FixtureError>,
    ) -> Result<(FieldErrorCatalog, Vec<TestScenario<R::Payload>>), FixtureError> {
        let catalog = self.orchestrator.field_errors::<R>()?;
        Ok((catalog, scenarios?))
    }
}
