use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use sitescore::adapters::Adapters;
use sitescore::audit::{AuditService, BasicAuditor};
use sitescore::config::FetchConfig;
use sitescore::models::{Company, Strategy};
use sitescore::server::{build_app, AppState};
use sitescore::store::AuditDb;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use tempfile::TempDir;
use tower::util::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestContext {
    _tmp: TempDir,
    _site: MockServer,
    app: axum::Router,
    company: Company,
    db_path: PathBuf,
}

async fn build_test_context() -> TestContext {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><title>Acme Plumbing</title>
            <meta name="viewport" content="width=device-width"></head>
            <body><h1>Acme Plumbing</h1><p>Blocked drains and burst pipes.</p></body></html>"#,
            "text/html",
        ))
        .mount(&site)
        .await;

    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("audits.db");
    let store = AuditDb::open(&db_path).await.unwrap();
    let company = Company::new("Acme Plumbing", &site.uri(), Some("plumbing".into())).unwrap();
    store.insert_company(&company).await.unwrap();

    let basic = BasicAuditor::new(&FetchConfig::default()).unwrap();
    let service = AuditService::new(store, Adapters::default(), basic, Strategy::Mobile);

    TestContext {
        _tmp: tmp,
        _site: site,
        app: build_app(AppState::new(service)),
        company,
        db_path,
    }
}

/// Remove the audits table behind the app's back so the next insert fails
async fn drop_audits_table(ctx: &TestContext) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(SqliteConnectOptions::new().filename(&ctx.db_path))
        .await
        .unwrap();
    sqlx::query("DROP TABLE seo_audits")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;
}

async fn request(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let resp = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_reports_ok() {
    let ctx = build_test_context().await;
    let (status, body) = request(&ctx.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn comprehensive_audit_for_unknown_company_is_404() {
    let ctx = build_test_context().await;
    let (status, body) = request(
        &ctx.app,
        "POST",
        "/api/companies/does-not-exist/audit/comprehensive",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Company not found");
}

#[tokio::test]
async fn comprehensive_audit_persists_and_responds() {
    let ctx = build_test_context().await;
    let uri = format!("/api/companies/{}/audit/comprehensive", ctx.company.id);
    let (status, body) = request(&ctx.app, "POST", &uri, None).await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["company_id"], ctx.company.id.as_str());
    assert_eq!(body["url"], ctx.company.website.as_str());
    assert!(body["scores"]["lighthouse"].is_null());
    assert!(body["scores"]["technical_seo"].is_u64());
    assert!(body["executive_summary"]
        .as_str()
        .unwrap()
        .starts_with("Audit completed for"));
    assert!(body["issues"].as_array().unwrap().len() <= 10);
    assert_eq!(body["competitors_count"], 0);

    let audit_uri = format!("/api/audits/{}", body["audit_id"].as_str().unwrap());
    let (status, stored) = request(&ctx.app, "GET", &audit_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["score"], body["overall_score"]);
    assert_eq!(stored["extended_data"]["keywords"]["primary"], "Acme Plumbing");
}

#[tokio::test]
async fn enhanced_audit_accepts_empty_and_partial_bodies() {
    let ctx = build_test_context().await;
    let uri = format!("/api/companies/{}/audit", ctx.company.id);

    let (status, first) = request(&ctx.app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK, "{}", first);
    assert_eq!(first["title"], "Acme Plumbing");
    assert_eq!(first["performance_score"], 85);

    let (status, second) = request(
        &ctx.app,
        "POST",
        &uri,
        Some(serde_json::json!({"include_crawl": false, "strategy": "desktop"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", second);

    let history_uri = format!("/api/companies/{}/audits", ctx.company.id);
    let (status, history) = request(&ctx.app, "GET", &history_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["id"], second["id"]);

    let (_, limited) = request(&ctx.app, "GET", &format!("{}?limit=1", history_uri), None).await;
    assert_eq!(limited.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_audit_and_route_are_404() {
    let ctx = build_test_context().await;
    let (status, body) = request(&ctx.app, "GET", "/api/audits/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Audit not found");

    let (status, _) = request(&ctx.app, "GET", "/api/companies/missing/audits", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(&ctx.app, "GET", "/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn enhanced_audit_rejects_malformed_bodies() {
    let ctx = build_test_context().await;
    let uri = format!("/api/companies/{}/audit", ctx.company.id);

    let (status, body) = request(
        &ctx.app,
        "POST",
        &uri,
        Some(serde_json::json!({"strategy": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Invalid request body");
    assert!(body["details"].is_string());

    let resp = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(&uri)
                .header("Content-Type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let history_uri = format!("/api/companies/{}/audits", ctx.company.id);
    let (_, history) = request(&ctx.app, "GET", &history_uri, None).await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn storage_failure_is_500_with_details() {
    let ctx = build_test_context().await;
    drop_audits_table(&ctx).await;

    let uri = format!("/api/companies/{}/audit/comprehensive", ctx.company.id);
    let (status, body) = request(&ctx.app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", body);
    assert_eq!(body["error"], "Comprehensive audit failed");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("seo_audits"));
    assert_eq!(body["company_id"], ctx.company.id.as_str());

    let uri = format!("/api/companies/{}/audit", ctx.company.id);
    let (status, body) = request(&ctx.app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Audit failed");
    assert_eq!(body["company_id"], ctx.company.id.as_str());
}
