//! Spreadsheet store against a mocked Sheets API and token endpoint.

use serde_json::{json, Value};
use std::sync::Arc;
use stockwatch::bot::WatchlistBot;
use stockwatch::config::BotConfig;
use stockwatch::core::now;
use stockwatch::intent::InboundMessage;
use stockwatch::store::{
    create_store, ServiceAccountKey, SheetBackend, SheetConfig, SheetRow, StoreConfig, Upsert, WatchlistStore,
};
use stockwatch::transport::MemoryTransport;
use stockwatch::{Error, StockCode, Watchlist};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const PRIVATE_KEY: &str = include_str!("fixtures/service_account_key.pem");
const VALUES: &str = "/v4/spreadsheets/sheet-id/values";

fn list(codes: &[&str]) -> Watchlist {
    codes.iter().map(|s| StockCode::parse(s).unwrap()).collect()
}

fn config(server: &MockServer) -> SheetConfig {
    let key = ServiceAccountKey {
        client_email: "bot@demo.iam.gserviceaccount.com".to_string(),
        private_key: PRIVATE_KEY.to_string(),
        private_key_id: Some("kid-1".to_string()),
        token_uri: format!("{}/token", server.uri()),
    };
    SheetConfig::new("sheet-id", key).with_api_base(&server.uri())
}

async fn mount_token(server: &MockServer, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant-type%3Ajwt-bearer"))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.test",
            "expires_in": 3600,
            "token_type": "Bearer",
        })))
        .expect(calls)
        .mount(server)
        .await;
}

async fn mount_values(server: &MockServer, values: Value) {
    Mock::given(method("GET"))
        .and(path(format!("{}/A1:D", VALUES)))
        .and(header("authorization", "Bearer ya29.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Sheet1!A1:D",
            "majorDimension": "ROWS",
            "values": values,
        })))
        .mount(server)
        .await;
}

async fn mount_ok(server: &MockServer, verb: &str, range: &str) {
    Mock::given(method(verb))
        .and(path(format!("{}/{}", VALUES, range)))
        .and(header("authorization", "Bearer ya29.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(server)
        .await;
}

async fn requests(server: &MockServer, verb: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == verb && r.url.path().starts_with(VALUES))
        .collect()
}

fn written_values(request: &Request) -> Vec<Vec<String>> {
    let body: Value = serde_json::from_slice(&request.body).unwrap();
    serde_json::from_value(body["values"].clone()).unwrap()
}

#[tokio::test]
async fn load_reads_codes_and_skips_other_rows() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_values(
        &server,
        json!([
            ["Code", "BuyDate", "Qty", "Price"],
            ["600519", "2024-01-02", "100", "1700.5"],
            ["Total", "", "100"],
            ["000001"],
        ]),
    )
    .await;

    let store = SheetBackend::new(config(&server)).unwrap();
    assert_eq!(store.load().await.unwrap(), list(&["000001", "600519"]));

    let rows = store.rows().await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].qty, "100");
    assert_eq!(rows[2].price, "0.0");
}

#[tokio::test]
async fn empty_sheet_is_empty_watchlist() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(format!("{}/A1:D", VALUES)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "range": "Sheet1!A1:D" })))
        .mount(&server)
        .await;

    let store = SheetBackend::new(config(&server)).unwrap();
    assert!(store.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn save_mirrors_rows_and_blanks_leftovers() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_values(
        &server,
        json!([
            ["Code", "BuyDate", "Qty", "Price"],
            ["600001", "2024-01-02", "300", "10.5"],
            ["600002", "2024-01-03", "200", "8.0"],
            ["600003", "2024-01-04", "100", "5.0"],
        ]),
    )
    .await;
    mount_ok(&server, "PUT", "A1:D3").await;
    mount_ok(&server, "POST", "A4:D:clear").await;

    let store = SheetBackend::new(config(&server)).unwrap();
    store.save(&list(&["600001", "600519"])).await.unwrap();

    let puts = requests(&server, "PUT").await;
    assert_eq!(puts.len(), 1);
    assert_eq!(
        puts[0].url.query_pairs().find(|(k, _)| k == "valueInputOption").map(|(_, v)| v.into_owned()),
        Some("RAW".to_string())
    );
    let values = written_values(&puts[0]);
    assert_eq!(values[0], vec!["Code", "BuyDate", "Qty", "Price"]);
    assert_eq!(values[1], vec!["600001", "2024-01-02", "300", "10.5"]);
    assert_eq!(values[2][0], "600519");
    assert_eq!(values[2][2], "0");
    assert_eq!(values[2][3], "0.0");

    assert_eq!(requests(&server, "POST").await.len(), 1);
}

#[tokio::test]
async fn growing_table_needs_no_clear() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_values(&server, json!([["Code", "BuyDate", "Qty", "Price"], ["600001"]])).await;
    mount_ok(&server, "PUT", "A1:D3").await;

    let store = SheetBackend::new(config(&server)).unwrap();
    store.save(&list(&["600001", "600002"])).await.unwrap();

    assert_eq!(requests(&server, "PUT").await.len(), 1);
    assert!(requests(&server, "POST").await.is_empty());
}

#[tokio::test]
async fn upsert_and_remove_rows() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_values(
        &server,
        json!([["Code", "BuyDate", "Qty", "Price"], ["600519", "2024-01-02", "100", "1700.5"]]),
    )
    .await;
    mount_ok(&server, "PUT", "A1:D2").await;
    mount_ok(&server, "PUT", "A1:D3").await;
    mount_ok(&server, "PUT", "A1:D1").await;
    mount_ok(&server, "POST", "A2:D:clear").await;

    let store = SheetBackend::new(config(&server)).unwrap();
    let code = StockCode::parse("600519").unwrap();

    let updated = store.upsert(SheetRow::new(&code).with_qty(10)).await.unwrap();
    assert_eq!(updated, Upsert::Updated);
    let added = store
        .upsert(SheetRow::new(&StockCode::parse("000001").unwrap()))
        .await
        .unwrap();
    assert_eq!(added, Upsert::Added);

    assert!(!store.remove(&StockCode::parse("600036").unwrap()).await.unwrap());
    assert!(store.remove(&code).await.unwrap());

    let puts = requests(&server, "PUT").await;
    assert_eq!(puts.len(), 3);
    assert_eq!(written_values(&puts[0])[1][2], "10");
    assert_eq!(written_values(&puts[1]).len(), 3);
    assert_eq!(written_values(&puts[2]), vec![vec!["Code", "BuyDate", "Qty", "Price"]]);
    assert_eq!(requests(&server, "POST").await.len(), 1);
}

#[tokio::test]
async fn upsert_rejects_invalid_code() {
    let server = MockServer::start().await;
    let store = SheetBackend::new(config(&server)).unwrap();
    let mut row = SheetRow::new(&StockCode::parse("600519").unwrap());
    row.code = "ABC".to_string();

    assert!(matches!(store.upsert(row).await, Err(Error::InvalidStockCode(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn clear_keeps_header() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_ok(&server, "POST", "A2:D:clear").await;

    let store = SheetBackend::new(config(&server)).unwrap();
    store.clear().await.unwrap();
    assert_eq!(requests(&server, "POST").await.len(), 1);
}

#[tokio::test]
async fn token_rejection_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&server)
        .await;

    let store = SheetBackend::new(config(&server)).unwrap();
    let err = store.load().await.unwrap_err();
    assert!(matches!(err, Error::Auth(ref m) if m.contains("invalid_grant")));
    assert!(!store.health_check().await.unwrap());
}

#[tokio::test]
async fn api_failure_is_store_error() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(format!("{}/A1:D", VALUES)))
        .respond_with(ResponseTemplate::new(403).set_body_string("caller does not have permission"))
        .mount(&server)
        .await;

    let store = SheetBackend::new(config(&server)).unwrap();
    let err = store.load().await.unwrap_err();
    assert!(matches!(err, Error::Store(ref m) if m.contains("403")));
}

#[tokio::test]
async fn bot_run_persists_to_sheet() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_values(
        &server,
        json!([["Code", "BuyDate", "Qty", "Price"], ["600001", "2024-01-02", "300", "10.5"]]),
    )
    .await;
    mount_ok(&server, "PUT", "A1:D3").await;

    let at = now();
    let transport = Arc::new(MemoryTransport::with_messages(vec![InboundMessage::new(
        1, "1001", "600519 list", at,
    )]));
    let store = create_store(&StoreConfig::sheet(config(&server))).unwrap();
    let bot = WatchlistBot::new(BotConfig::new(), transport.clone(), store).unwrap();
    let report = bot.run_once_at(at).await.unwrap();

    assert!(report.changed);
    assert!(report.acknowledged);
    let values = written_values(&requests(&server, "PUT").await[0]);
    let codes: Vec<&str> = values[1..].iter().map(|r| r[0].as_str()).collect();
    assert_eq!(codes, vec!["600001", "600519"]);

    let replies = transport.replies().await;
    assert_eq!(replies.len(), 2);
    assert!(replies[0].text.contains("added: 600519"));
    assert!(replies[1].text.contains("(2)"));
}

#[tokio::test]
async fn failed_sheet_write_leaves_messages_pending() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_values(&server, json!([["Code", "BuyDate", "Qty", "Price"]])).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let at = now();
    let transport = Arc::new(MemoryTransport::with_messages(vec![InboundMessage::new(
        4, "1001", "600519", at,
    )]));
    let store = create_store(&StoreConfig::sheet(config(&server))).unwrap();
    let bot = WatchlistBot::new(BotConfig::new(), transport.clone(), store).unwrap();

    assert!(bot.run_once_at(at).await.is_err());
    assert!(transport.acknowledged().await.is_empty());
    assert_eq!(transport.pending().await.len(), 1);
}
