use anyhow::Result;
use bookcheck_harness::error::FixtureError;
use bookcheck_harness::model::{Author, Book};
use bookcheck_harness::transport::Method;
use bookcheck_harness::verify::Outcome;
use serde_json::json;

use crate::common::Faults;
use crate::test_helper::BookstoreTestBuilder;

fn conflict_scenario(extra: serde_json::Value) -> serde_json::Value {
    let mut scenario = json!({
        "testName": "duplicate id", "expectedStatusCode": 409,
        "id": 1, "idBook": 1, "firstName": "Jane", "lastName": "Doe"
    });
    if let (Some(target), Some(extra)) = (scenario.as_object_mut(), extra.as_object()) {
        target.extend(extra.clone());
    }
    json!([scenario])
}

#[tokio::test]
async fn test_author_missing_id_yields_conversion_error() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data().build()?;
    let orchestrator = state.orchestrator();
    let catalog = orchestrator.field_errors::<Author>()?;

    let scenarios = orchestrator.create_scenarios::<Author>()?;
    let missing_id = scenarios
        .iter()
        .find(|s| s.test_name == "missing id")
        .ok_or_else(|| anyhow::anyhow!("scenario not loaded"))?;
    assert_eq!(missing_id.expected_status_code, 400);
    assert_eq!(missing_id.payload.id, None);
    assert_eq!(missing_id.payload.id_book, Some(5));

    orchestrator
        .run_create_scenario::<Author>(missing_id, &catalog)
        .await?;

    assert_eq!(state.reporter.count("envelope", Outcome::Passed), 1);
    assert_eq!(state.reporter.count("field-error", Outcome::Passed), 1);
    let events = state.reporter.events();
    assert!(events
        .iter()
        .any(|e| e.check == "field-error" && e.detail.contains("$.id")));
    Ok(())
}

#[tokio::test]
async fn test_every_sample_scenario_passes() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data().build()?;
    let orchestrator = state.orchestrator();

    let authors = orchestrator.field_errors::<Author>()?;
    for scenario in orchestrator.create_scenarios::<Author>()? {
        orchestrator
            .run_create_scenario::<Author>(&scenario, &authors)
            .await?;
    }
    for scenario in orchestrator.update_scenarios::<Author>()? {
        orchestrator
            .run_update_scenario::<Author>(&scenario, &authors)
            .await?;
    }

    let books = orchestrator.field_errors::<Book>()?;
    for scenario in orchestrator.create_scenarios::<Book>()? {
        orchestrator
            .run_create_scenario::<Book>(&scenario, &books)
            .await?;
    }
    for scenario in orchestrator.update_scenarios::<Book>()? {
        orchestrator
            .run_update_scenario::<Book>(&scenario, &books)
            .await?;
    }

    assert!(state.reporter.failures().is_empty());
    state.assert_request_sent(Method::Put, "/Authors/2")?;
    Ok(())
}

#[tokio::test]
async fn test_absent_fields_are_sent_as_null_and_falsy_values_survive() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data().build()?;
    let orchestrator = state.orchestrator();
    let catalog = orchestrator.field_errors::<Book>()?;

    for scenario in orchestrator.create_scenarios::<Book>()? {
        orchestrator
            .run_create_scenario::<Book>(&scenario, &catalog)
            .await?;
    }

    let bodies: Vec<_> = state
        .api
        .requests()
        .into_iter()
        .filter(|r| r.method == Method::Post)
        .filter_map(|r| r.body)
        .collect();
    assert_eq!(bodies.len(), 4);

    // "zero pages": present but falsy
    assert_eq!(bodies[1]["pageCount"], json!(0));
    assert_eq!(bodies[1]["title"], json!(""));
    // "missing title and page count": keys absent in the fixture
    assert!(bodies[3]["title"].is_null());
    assert!(bodies[3]["pageCount"].is_null());
    assert_eq!(bodies[3]["id"], json!(203));
    Ok(())
}

#[tokio::test]
async fn test_books_expect_one_error_per_absent_field() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data().build()?;
    let orchestrator = state.orchestrator();
    let catalog = orchestrator.field_errors::<Book>()?;

    let scenario = orchestrator
        .create_scenarios::<Book>()?
        .into_iter()
        .find(|s| s.test_name == "missing title and page count")
        .ok_or_else(|| anyhow::anyhow!("scenario not loaded"))?;
    orchestrator
        .run_create_scenario::<Book>(&scenario, &catalog)
        .await?;

    assert_eq!(state.reporter.count("field-error", Outcome::Passed), 2);
    Ok(())
}

#[tokio::test]
async fn test_authors_expect_only_the_first_absent_field() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data().build()?;
    let orchestrator = state.orchestrator();
    let catalog = orchestrator.field_errors::<Author>()?;

    let scenario = orchestrator
        .create_scenarios::<Author>()?
        .into_iter()
        .find(|s| s.test_name == "missing id and idBook")
        .ok_or_else(|| anyhow::anyhow!("scenario not loaded"))?;
    orchestrator
        .run_create_scenario::<Author>(&scenario, &catalog)
        .await?;

    assert_eq!(state.reporter.count("field-error", Outcome::Passed), 1);
    Ok(())
}

#[tokio::test]
async fn test_field_error_fixture_overrides_default_wording() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data()
        .with_fixture(
            "authors/field_errors",
            json!([
                {"field": "id", "fieldPath": "$.id", "message": "The id is required."}
            ]),
        )
        .build()?;
    let orchestrator = state.orchestrator();
    let catalog = orchestrator.field_errors::<Author>()?;
    assert_eq!(catalog.rules().len(), 1);

    let scenario = orchestrator
        .create_scenarios::<Author>()?
        .into_iter()
        .find(|s| s.test_name == "missing id")
        .ok_or_else(|| anyhow::anyhow!("scenario not loaded"))?;
    let err = orchestrator
        .run_create_scenario::<Author>(&scenario, &catalog)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "field-error");
    assert!(err.to_string().contains("The id is required."));
    Ok(())
}

#[tokio::test]
async fn test_unexpected_acceptance_fails_on_status() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data()
        .with_fixture(
            "authors/create_authors_test_data",
            json!([
                {"testName": "rejection expected", "expectedStatusCode": 400,
                 "id": 77, "idBook": 1, "firstName": "Jane", "lastName": "Doe"}
            ]),
        )
        .build()?;
    let orchestrator = state.orchestrator();
    let catalog = orchestrator.field_errors::<Author>()?;
    let scenarios = orchestrator.create_scenarios::<Author>()?;

    let err = orchestrator
        .run_create_scenario::<Author>(&scenarios[0], &catalog)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "status");
    // latency is asserted before the status, on every scenario
    assert_eq!(state.reporter.count("latency", Outcome::Passed), 1);
    Ok(())
}

#[tokio::test]
async fn test_missing_scenario_table_is_a_fixture_error() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data()
        .without_fixture("books/update_books_test_data")
        .build()?;

    let result = state.orchestrator().update_scenarios::<Book>();
    assert!(matches!(result, Err(FixtureError::NotFound { .. })));
    Ok(())
}

#[tokio::test]
async fn test_conflict_without_an_envelope_fails() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data()
        .with_fixture("authors/create_authors_test_data", conflict_scenario(json!({})))
        .with_faults(Faults {
            canned_write: Some((409, "<html>not an envelope</html>".to_string())),
            ..Faults::default()
        })
        .build()?;
    let orchestrator = state.orchestrator();
    let catalog = orchestrator.field_errors::<Author>()?;
    let scenarios = orchestrator.create_scenarios::<Author>()?;

    let err = orchestrator
        .run_create_scenario::<Author>(&scenarios[0], &catalog)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "decode");
    state.assert_assertion_failed("decode")?;
    Ok(())
}

#[tokio::test]
async fn test_conflict_envelope_is_checked_against_its_title() -> Result<()> {
    let envelope = json!({
        "type": "https://tools.ietf.org/html/rfc9110#section-15.5.10",
        "title": "Conflict",
        "status": 409,
        "traceId": "00-0f1e2d3c4b5a69788796a5b4c3d2e1f0-0123456789abcdef-00"
    });
    let state = BookstoreTestBuilder::with_sample_data()
        .with_fixture("authors/create_authors_test_data", conflict_scenario(json!({})))
        .with_faults(Faults {
            canned_write: Some((409, envelope.to_string())),
            ..Faults::default()
        })
        .build()?;
    let orchestrator = state.orchestrator();
    let catalog = orchestrator.field_errors::<Author>()?;
    let scenarios = orchestrator.create_scenarios::<Author>()?;

    orchestrator
        .run_create_scenario::<Author>(&scenarios[0], &catalog)
        .await?;
    assert_eq!(state.reporter.count("envelope", Outcome::Passed), 1);
    assert_eq!(state.reporter.count("field-error", Outcome::Passed), 0);
    Ok(())
}

#[tokio::test]
async fn test_expected_title_overrides_the_status_default() -> Result<()> {
    let envelope = json!({
        "type": "https://tools.ietf.org/html/rfc9110#section-15.5.10",
        "title": "Conflict",
        "status": 409,
        "traceId": "00-0f1e2d3c4b5a69788796a5b4c3d2e1f0-0123456789abcdef-00"
    });
    let state = BookstoreTestBuilder::with_sample_data()
        .with_fixture(
            "authors/create_authors_test_data",
            conflict_scenario(json!({"expectedTitle": "Author already exists"})),
        )
        .with_faults(Faults {
            canned_write: Some((409, envelope.to_string())),
            ..Faults::default()
        })
        .build()?;
    let orchestrator = state.orchestrator();
    let catalog = orchestrator.field_errors::<Author>()?;
    let scenarios = orchestrator.create_scenarios::<Author>()?;
    assert_eq!(
        scenarios[0].expected_title.as_deref(),
        Some("Author already exists")
    );

    let err = orchestrator
        .run_create_scenario::<Author>(&scenarios[0], &catalog)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "envelope");
    assert!(err.to_string().contains("Author already exists"));
    Ok(())
}
