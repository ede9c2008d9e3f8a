use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use mockito::{Matcher, Server, ServerGuard};
use qbo_bridge::api::AccountingApi;
use qbo_bridge::db::{Account, AccountsStorage, CredentialsStorage, connect};
use qbo_bridge::intuit::credentials::{BEARER, issued_now};
use qbo_bridge::router::{BridgeState, bridge_router};
use qbo_bridge::service::sync_scheduler;
use qbo_bridge::{AccountSync, IntuitOauthEndpoints, QboCredential, TokenManager};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use url::Url;

const TOKEN_PATH: &str = "/oauth2/v1/tokens/bearer";

struct TestApp {
    app: Router,
    accounts: AccountsStorage,
    credentials: CredentialsStorage,
}

async fn test_app(server: &ServerGuard) -> TestApp {
    let pool = connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    let credentials = CredentialsStorage::new(pool.clone());
    let accounts = AccountsStorage::new(pool);
    let http = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("failed to build http client");
    let token_url = Url::parse(&format!("{}{TOKEN_PATH}", server.url())).expect("bad token url");
    let endpoints = IntuitOauthEndpoints::new("client", "secret", None, token_url, http.clone())
        .expect("failed to build endpoints");
    let api = AccountingApi::new(http, Url::parse(&server.url()).expect("bad api base"));
    let tokens = TokenManager::new(credentials.clone(), endpoints);
    let sync = Arc::new(AccountSync::new(tokens.clone(), api, accounts.clone()));
    let scheduler = sync_scheduler::spawn(sync, None)
        .await
        .expect("failed to spawn scheduler");
    TestApp {
        app: bridge_router(BridgeState::new(scheduler, accounts.clone(), tokens)),
        accounts,
        credentials,
    }
}

fn account(
    id: i64,
    classification: &str,
    active: bool,
    balance: f64,
    parent_id: Option<i64>,
) -> Account {
    Account {
        id,
        name: Some(format!("Account {id}")),
        classification: Some(classification.to_string()),
        currency: Some("USD".to_string()),
        account_type: None,
        active,
        current_balance: balance,
        parent_id,
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let json = serde_json::from_slice(&body).expect("response body was not json");
    (status, json)
}

#[tokio::test]
async fn health_reports_ok() {
    let server = Server::new_async().await;
    let t = test_app(&server).await;

    let (status, body) = get(&t.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn search_applies_filters_conjunctively() {
    let server = Server::new_async().await;
    let t = test_app(&server).await;
    t.accounts
        .upsert_many(&[
            account(1, "Asset", true, 10.0, None),
            account(2, "Asset", false, 20.0, None),
            account(3, "Expense", true, 30.0, None),
        ])
        .await
        .expect("seed failed");

    let (status, body) = get(&t.app, "/accounts/search?active=true&classification=Asset").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .expect("expected a list")
        .iter()
        .map(|a| a["id"].as_i64().expect("id"))
        .collect();
    assert_eq!(ids, vec![1]);

    let (_, body) = get(&t.app, "/accounts/search?classification=").await;
    assert_eq!(body.as_array().expect("expected a list").len(), 3);
}

#[tokio::test]
async fn summary_is_sorted_and_rounded() {
    let server = Server::new_async().await;
    let t = test_app(&server).await;
    t.accounts
        .upsert_many(&[
            account(1, "Asset", true, 5000.0, None),
            account(2, "Liability", true, -1200.5, None),
            account(3, "Expense", true, 800.25, None),
        ])
        .await
        .expect("seed failed");

    let resp = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/accounts/summary")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    assert_eq!(
        std::str::from_utf8(&body).expect("response body was not utf-8"),
        r#"{"Asset":5000.0,"Expense":800.25,"Liability":-1200.5}"#
    );
}

#[tokio::test]
async fn tree_omits_orphans() {
    let server = Server::new_async().await;
    let t = test_app(&server).await;
    t.accounts
        .upsert_many(&[
            account(1, "Asset", true, 0.0, None),
            account(2, "Asset", true, 0.0, Some(1)),
            account(3, "Asset", true, 0.0, Some(1)),
            account(4, "Asset", true, 0.0, Some(99)),
        ])
        .await
        .expect("seed failed");

    let (status, body) = get(&t.app, "/accounts/tree").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "id": 1,
            "name": "Account 1",
            "children": [
                {"id": 2, "name": "Account 2", "children": []},
                {"id": 3, "name": "Account 3", "children": []},
            ],
        }])
    );
}

#[tokio::test]
async fn sync_without_credential_is_unauthorized() {
    let server = Server::new_async().await;
    let t = test_app(&server).await;

    let (status, body) = get(&t.app, "/accounts").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Credential not found");
    assert!(body.get("details").is_some());
}

#[tokio::test]
async fn sync_returns_stored_accounts() {
    let mut server = Server::new_async().await;
    let query = server
        .mock("GET", "/v3/company/12345/query")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("query".into(), "select * from Account".into()),
            Matcher::UrlEncoded("minorversion".into(), "65".into()),
        ]))
        .match_header("authorization", "Bearer access")
        .with_status(200)
        .with_body(
            r#"{"QueryResponse":{"Account":[
                {"Id":"10","Name":"Bank","Classification":"Asset","CurrencyRef":{"value":"USD"},"Active":true,"CurrentBalance":12.5},
                {"Id":"11","Name":"Petty Cash","Classification":"Asset","SubAccount":true,"ParentRef":{"value":"10"}}
            ]}}"#,
        )
        .expect(1)
        .create_async()
        .await;
    let t = test_app(&server).await;
    t.credentials
        .replace_all(&QboCredential {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_in: 3600,
            realm_id: "12345".to_string(),
            token_type: BEARER.to_string(),
            issued_at: issued_now(),
        })
        .await
        .expect("seed failed");

    let (status, body) = get(&t.app, "/accounts").await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().expect("expected a list");
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["currency"], "USD");
    assert_eq!(list[1]["parent_id"], 10);
    query.assert_async().await;
}

#[tokio::test]
async fn upstream_failure_maps_to_bad_gateway() {
    let mut server = Server::new_async().await;
    let _query = server
        .mock("GET", "/v3/company/12345/query")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"error":"boom"}"#)
        .create_async()
        .await;
    let t = test_app(&server).await;
    t.credentials
        .replace_all(&QboCredential {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_in: 3600,
            realm_id: "12345".to_string(),
            token_type: BEARER.to_string(),
            issued_at: issued_now(),
        })
        .await
        .expect("seed failed");

    let (status, body) = get(&t.app, "/accounts").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to fetch accounts");
    assert_eq!(body["details"]["status"], 500);
    assert_eq!(body["details"]["body"]["error"], "boom");
}

#[tokio::test]
async fn callback_exchanges_code_and_stores_credential() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", TOKEN_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("code".into(), "auth-code".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"access_token":"a1","refresh_token":"r1","expires_in":3600,"token_type":"bearer","x_refresh_token_expires_in":8726400}"#,
        )
        .expect(1)
        .create_async()
        .await;
    let t = test_app(&server).await;

    let (status, body) = get(&t.app, "/callback?code=auth-code&realmId=67890").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"message": "Authorization successful", "realm_id": "67890"})
    );
    token.assert_async().await;

    let stored = t
        .credentials
        .get_latest()
        .await
        .expect("read failed")
        .expect("credential missing");
    assert_eq!(stored.access_token, "a1");
    assert_eq!(stored.realm_id, "67890");
}

#[tokio::test]
async fn callback_without_realm_is_rejected() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", TOKEN_PATH)
        .expect(0)
        .create_async()
        .await;
    let t = test_app(&server).await;

    let (status, body) = get(&t.app, "/callback?code=auth-code").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid OAuth callback");
    token.assert_async().await;
}

#[tokio::test]
async fn rejected_exchange_is_bad_request() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", TOKEN_PATH)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"invalid_grant"}"#)
        .create_async()
        .await;
    let t = test_app(&server).await;

    let (status, body) = get(&t.app, "/callback?code=bad&realmId=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Authorization failed");
    assert!(
        body["details"]
            .as_str()
            .expect("details should be a string")
            .contains("invalid_grant")
    );
    assert_eq!(t.credentials.count().await.expect("count failed"), 0);
}
