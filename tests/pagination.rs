//! End-to-end pagination through the client

mod common;

use anyhow::Result;
use common::{LeadsServer, client_with};
use std::sync::Arc;
use std::time::Duration;
use zoho_crm::api::{
    CrmError, PaginationState, Paginator, RequestOutcome, ResponseFormat, ResponseMode,
    UrlParameters, ZohoResponseParser,
};
use zoho_crm::api::constants::PAGE_MAX_SIZE;

async fn fetch_all(total: u32) -> Result<(Arc<LeadsServer>, Vec<String>)> {
    let server = Arc::new(LeadsServer::new(total));
    let client = client_with(server.clone());
    client.set_response_mode(ResponseMode::RecordsArray);

    let records = client
        .request("Leads", "getRecords", UrlParameters::new(), true, ResponseFormat::Json)
        .await?
        .into_output()
        .and_then(|o| o.into_records())
        .unwrap();

    let ids = records
        .iter()
        .map(|r| r["LEADID"].as_str().unwrap().to_string())
        .collect();
    Ok((server, ids))
}

#[tokio::test]
async fn test_partial_last_page_ends_pagination() -> Result<()> {
    let (server, ids) = fetch_all(450).await?;

    assert_eq!(server.calls(), 3);
    assert_eq!(server.windows(), vec![(1, 200), (201, 400), (401, 600)]);
    assert_eq!(ids.len(), 450);
    assert_eq!(ids.first().map(String::as_str), Some("L1"));
    assert_eq!(ids.last().map(String::as_str), Some("L450"));
    assert!(ids.iter().enumerate().all(|(i, id)| *id == format!("L{}", i + 1)));
    Ok(())
}

#[tokio::test]
async fn test_exact_multiple_requests_one_empty_page() -> Result<()> {
    let (server, ids) = fetch_all(2 * PAGE_MAX_SIZE).await?;

    assert_eq!(server.calls(), 3);
    assert_eq!(ids.len(), 400);
    Ok(())
}

#[tokio::test]
async fn test_empty_result_set() -> Result<()> {
    let (server, ids) = fetch_all(0).await?;

    assert_eq!(server.calls(), 1);
    assert!(ids.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_failure_on_second_of_three_pages() -> Result<()> {
    let server = Arc::new(LeadsServer::failing_on(450, 2));
    let client = client_with(server.clone());

    // auto-fetch reports the failure alongside the pages before it
    client.set_response_mode(ResponseMode::RecordsArray);
    let outcome = client
        .request("Leads", "getRecords", UrlParameters::new(), true, ResponseFormat::Json)
        .await?;
    assert_eq!(outcome.error(), Some(&CrmError::transport(Some(500), "internal error")));

    let (partial, error) = outcome.into_partial().unwrap();
    assert_eq!(error, CrmError::transport(Some(500), "internal error"));
    let records = partial.into_records().unwrap();
    assert_eq!(records.len(), 200);
    assert_eq!(records[0]["LEADID"], "L1");
    assert_eq!(records[199]["LEADID"], "L200");
    assert_eq!(server.calls(), 2);

    // driven manually, the partial data stays inspectable
    let server = Arc::new(LeadsServer::failing_on(450, 2));
    let client = client_with(server.clone());
    client.set_auto_fetch_paginated_requests(false);

    let mut paginator = client
        .request("Leads", "getRecords", UrlParameters::new(), true, ResponseFormat::Json)
        .await?
        .into_paginator()
        .unwrap();

    assert!(paginator.fetch_all().await.is_err());
    assert_eq!(paginator.state(), PaginationState::Failed);
    assert_eq!(paginator.records().len(), 200);
    assert_eq!(paginator.pages_fetched(), 1);
    assert_eq!(
        paginator.last_error(),
        Some(&CrmError::transport(Some(500), "internal error"))
    );
    Ok(())
}

#[tokio::test]
async fn test_manual_pages_keep_window_order() -> Result<()> {
    let server = Arc::new(LeadsServer::new(5));
    let client = client_with(server.clone());
    client.set_auto_fetch_paginated_requests(false);

    let outcome = client
        .request("Leads", "getRecords", UrlParameters::new(), true, ResponseFormat::Json)
        .await?;
    let request = match outcome {
        RequestOutcome::Paginator(paginator) => paginator.request().clone(),
        _ => panic!("expected a paginator"),
    };

    let mut paginator =
        Paginator::new(request, server.clone(), Arc::new(ZohoResponseParser)).with_page_size(2);

    assert_eq!(paginator.fetch_next_page().await?, PaginationState::Ready);
    assert_eq!(paginator.fetch_next_page().await?, PaginationState::Ready);
    assert_eq!(paginator.fetch_next_page().await?, PaginationState::Exhausted);

    assert_eq!(server.windows(), vec![(1, 2), (3, 4), (5, 6)]);
    let response = paginator.get_aggregated_response()?;
    assert_eq!(response.raw_payloads().len(), 3);
    assert_eq!(response.len(), 5);
    Ok(())
}

#[tokio::test]
async fn test_timeout_cancels_page_in_flight() -> Result<()> {
    let server = Arc::new(LeadsServer {
        slow_from_call: Some((2, Duration::from_secs(5))),
        ..LeadsServer::new(450)
    });
    let client = client_with(server.clone());
    client.set_auto_fetch_paginated_requests(false);

    let mut paginator = client
        .request("Leads", "getRecords", UrlParameters::new(), true, ResponseFormat::Json)
        .await?
        .into_paginator()
        .unwrap();

    let err = paginator
        .fetch_all_with_timeout(Duration::from_millis(100))
        .await
        .unwrap_err();

    assert_eq!(err, CrmError::Cancelled);
    assert_eq!(paginator.state(), PaginationState::Failed);
    assert_eq!(paginator.records().len(), 200);
    assert_eq!(server.calls(), 2);
    Ok(())
}

#[tokio::test]
async fn test_caller_signal_cancels() -> Result<()> {
    let server = Arc::new(LeadsServer {
        slow_from_call: Some((1, Duration::from_secs(5))),
        ..LeadsServer::new(10)
    });
    let client = client_with(server.clone());
    client.set_auto_fetch_paginated_requests(false);

    let mut paginator = client
        .request("Leads", "getRecords", UrlParameters::new(), true, ResponseFormat::Json)
        .await?
        .into_paginator()
        .unwrap();

    let (cancel_tx, cancel_rx) = tokio::sync::oneshot::channel::<()>();
    cancel_tx.send(()).unwrap();

    let err = paginator
        .fetch_all_until(async {
            let _ = cancel_rx.await;
        })
        .await
        .unwrap_err();

    // the signal had already fired, so no page was requested
    assert_eq!(err, CrmError::Cancelled);
    assert_eq!(paginator.state(), PaginationState::Failed);
    assert_eq!(server.calls(), 0);
    assert_eq!(paginator.get_aggregated_response().unwrap_err(), CrmError::NotYetFetched);
    Ok(())
}
