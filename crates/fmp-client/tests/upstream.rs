use fmp_client::{FmpClient, FmpConfig};
use httpmock::prelude::*;
use serde_json::json;
use statement_core::{StatementError, StatementSource};

const PATH: &str = "/api/v3/income-statement/AAPL";

fn client_for(server: &MockServer) -> FmpClient {
    FmpClient::new(FmpConfig {
        base_url: server.base_url(),
        ..FmpConfig::new("test-key-0123456789")
    })
    .unwrap()
}

fn statement(date: &str, revenue: i64) -> serde_json::Value {
    json!({
        "date": date,
        "symbol": "AAPL",
        "revenue": revenue,
        "netIncome": revenue / 4,
        "grossProfit": revenue / 2,
        "eps": 6.11,
        "operatingIncome": revenue / 3,
    })
}

#[tokio::test]
async fn fetches_annual_statements_with_api_key() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(PATH)
                .query_param("period", "annual")
                .query_param("apikey", "test-key-0123456789");
            then.status(200)
                .json_body(json!([statement("2023-09-30", 383), statement("2022-09-24", 394)]));
        })
        .await;

    let statements = client_for(&server).fetch_statements().await.unwrap();

    mock.assert_async().await;
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].date, "2023-09-30");
    assert_eq!(statements[1].revenue, 394.0);
}

#[tokio::test]
async fn non_success_status_is_upstream_error_without_retry() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path(PATH);
            then.status(503).body("maintenance");
        })
        .await;

    let err = client_for(&server).get_income_statements().await.unwrap_err();

    // exactly one call: failures are not retried
    mock.assert_async().await;
    match err {
        StatementError::Upstream(message) => {
            assert!(message.contains("503"));
            assert!(message.contains("maintenance"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn provider_error_object_is_upstream_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(PATH);
            then.status(200).json_body(json!({"Error Message": "Invalid API KEY."}));
        })
        .await;

    let err = client_for(&server).get_income_statements().await.unwrap_err();
    assert_eq!(err, StatementError::Upstream("Provider error: Invalid API KEY.".to_string()));
}

#[tokio::test]
async fn missing_field_is_malformed_record() {
    let server = MockServer::start_async().await;
    let mut broken = statement("2022-09-24", 394);
    broken.as_object_mut().unwrap().remove("operatingIncome");
    server
        .mock_async(move |when, then| {
            when.method(GET).path(PATH);
            then.status(200).json_body(json!([statement("2023-09-30", 383), broken]));
        })
        .await;

    let err = client_for(&server).get_income_statements().await.unwrap_err();
    assert!(matches!(err, StatementError::MalformedRecord { index: 1, .. }));
}

#[tokio::test]
async fn invalid_json_is_upstream_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(PATH);
            then.status(200).body("<html>not json</html>");
        })
        .await;

    let err = client_for(&server).get_income_statements().await.unwrap_err();
    assert_eq!(err.kind(), "UPSTREAM_ERROR");
    assert!(!err.to_string().contains("test-key-0123456789"));
}

#[tokio::test]
async fn unreachable_provider_is_upstream_error() {
    let client = FmpClient::new(FmpConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        ..FmpConfig::new("test-key-0123456789")
    })
    .unwrap();

    let err = client.get_income_statements().await.unwrap_err();
    assert!(matches!(err, StatementError::Upstream(_)));
    assert!(!err.to_string().contains("test-key-0123456789"));
}
