use std::time::Duration;

use anyhow::Result;
use bookcheck_harness::model::{Author, Book};
use bookcheck_harness::orchestrator::{MALFORMED_ID, SQL_INJECTION_ID};
use bookcheck_harness::transport::Method;

use crate::common::Faults;
use crate::test_helper::{BookstoreTestBuilder, TestData};

#[tokio::test]
async fn test_list_consistency_passes_when_api_matches_golden_data() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data().build()?;
    let orchestrator = state.orchestrator();

    orchestrator.check_list_consistency::<Book>().await?;
    orchestrator.check_list_consistency::<Author>().await?;

    state.assert_request_sent(Method::Get, "/api/v1/Books")?;
    state.assert_request_sent(Method::Get, "/api/v1/Authors")?;
    assert!(state.reporter.failures().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_list_consistency_tolerates_extra_items() -> Result<()> {
    let mut served = TestData::authors();
    served.push(TestData::author(9, 4, "Extra", "Author"));

    let state = BookstoreTestBuilder::with_sample_data()
        .serving_authors(served)
        .build()?;
    state
        .orchestrator()
        .check_list_consistency::<Author>()
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_list_consistency_reports_missing_golden_item() -> Result<()> {
    let served = TestData::authors().into_iter().skip(1).collect();
    let state = BookstoreTestBuilder::with_sample_data()
        .serving_authors(served)
        .build()?;

    let err = state
        .orchestrator()
        .check_list_consistency::<Author>()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "missing-items");
    assert!(err.to_string().contains("First Name 1"));
    Ok(())
}

#[tokio::test]
async fn test_list_consistency_detects_a_changed_field() -> Result<()> {
    let mut served = TestData::books();
    served[2].page_count = 1;
    let state = BookstoreTestBuilder::with_sample_data()
        .serving_books(served)
        .build()?;

    let err = state
        .orchestrator()
        .check_list_consistency::<Book>()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "missing-items");
    Ok(())
}

#[tokio::test]
async fn test_list_consistency_reports_duplicates() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data()
        .with_faults(Faults {
            duplicate_listing: true,
            ..Faults::default()
        })
        .build()?;

    let err = state
        .orchestrator()
        .check_list_consistency::<Book>()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "duplicate-items");
    state.assert_assertion_failed("duplicate-items")?;
    Ok(())
}

#[tokio::test]
async fn test_get_existing_returns_first_golden_item() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data().build()?;
    let orchestrator = state.orchestrator();

    orchestrator.check_get_existing::<Book>().await?;
    orchestrator.check_get_existing::<Author>().await?;

    state.assert_request_sent(Method::Get, "/Books/1")?;
    state.assert_request_sent(Method::Get, "/Authors/1")?;
    Ok(())
}

#[tokio::test]
async fn test_get_existing_requires_golden_data() -> Result<()> {
    let state = BookstoreTestBuilder::new().build()?;
    let err = state
        .orchestrator()
        .check_get_existing::<Author>()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "precondition");
    state.assert_no_requests_sent()?;
    Ok(())
}

#[tokio::test]
async fn test_get_unknown_uses_one_past_highest_listed_id() -> Result<()> {
    let served = vec![
        TestData::book(4, "Four", 4),
        TestData::book(17, "Seventeen", 17),
        TestData::book(9, "Nine", 9),
    ];
    let state = BookstoreTestBuilder::with_sample_data()
        .serving_books(served)
        .build()?;

    state.orchestrator().check_get_unknown::<Book>().await?;
    state.assert_request_sent(Method::Get, "/Books/18")?;
    Ok(())
}

#[tokio::test]
async fn test_get_unknown_checks_not_found_title() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data()
        .with_faults(Faults {
            not_found_title: Some("Missing".to_string()),
            ..Faults::default()
        })
        .build()?;

    let err = state
        .orchestrator()
        .check_get_unknown::<Author>()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "envelope");
    assert!(err.to_string().contains("Missing"));
    Ok(())
}

#[tokio::test]
async fn test_malformed_ids_are_rejected_by_validation() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data().build()?;
    let orchestrator = state.orchestrator();

    orchestrator.check_get_malformed::<Book>(MALFORMED_ID).await?;
    orchestrator
        .check_get_malformed::<Book>(SQL_INJECTION_ID)
        .await?;
    orchestrator
        .check_get_malformed::<Author>(SQL_INJECTION_ID)
        .await?;

    state.assert_request_sent(Method::Get, "/Books/invalidID")?;
    state.assert_request_sent(Method::Get, "/Authors/' OR 1=1; --")?;
    assert!(state.reporter.failures().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_latency_bound_is_inclusive() -> Result<()> {
    let at_bound = BookstoreTestBuilder::with_sample_data()
        .with_max_response_time(500)
        .with_faults(Faults {
            latency: Some(Duration::from_millis(500)),
            ..Faults::default()
        })
        .build()?;
    at_bound.orchestrator().check_get_existing::<Book>().await?;

    let over = BookstoreTestBuilder::with_sample_data()
        .with_max_response_time(500)
        .with_faults(Faults {
            latency: Some(Duration::from_millis(501)),
            ..Faults::default()
        })
        .build()?;
    let err = over
        .orchestrator()
        .check_get_existing::<Book>()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "latency");
    assert!(err.to_string().contains("501ms"));
    Ok(())
}

#[tokio::test]
async fn test_malformed_golden_fixture_is_a_fixture_error() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data()
        .with_raw_fixture("books/books", r#"[{"id": 1, "title": "no page count"}]"#)
        .build()?;

    let err = state
        .orchestrator()
        .check_list_consistency::<Book>()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "fixture");
    state.assert_no_requests_sent()?;
    Ok(())
}

#[tokio::test]
async fn test_unreachable_api_is_a_transport_error() -> Result<()> {
    let state = BookstoreTestBuilder::with_sample_data()
        .with_faults(Faults {
            unreachable: true,
            ..Faults::default()
        })
        .build()?;

    let err = state
        .orchestrator()
        .check_get_existing::<Author>()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "transport");
    assert!(err.to_string().contains("connection refused"));
    Ok(())
}
