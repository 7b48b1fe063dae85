//! HTTP API
//!
//! Routes:
//! - `GET  /health`
//! - `POST /api/companies/:id/audit/comprehensive`
//! - `POST /api/companies/:id/audit`
//! - `GET  /api/companies/:id/audits?limit=`
//! - `GET  /api/audits/:id`

use crate::audit::{AuditRequest, AuditService};
use crate::error::{Error, Result};
use crate::store::DEFAULT_HISTORY_LIMIT;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: AuditService,
}

impl AppState {
    pub fn new(service: AuditService) -> Self {
        Self { service }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<u32>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

fn error_response(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn not_found(message: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, json!({ "error": message }))
}

/// Map a pipeline error to a response; unknown companies are 404
fn failure_response(err: Error, message: &str, company_id: &str) -> Response {
    match err {
        Error::CompanyNotFound(_) => not_found("Company not found"),
        Error::AuditNotFound(_) => not_found("Audit not found"),
        other => {
            error!(company_id, error = %other, "{}", message);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": message,
                    "details": other.to_string(),
                    "company_id": company_id,
                }),
            )
        }
    }
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn comprehensive_audit(State(state): State<AppState>, Path(company_id): Path<String>) -> Response {
    match state.service.comprehensive(&company_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => failure_response(e, "Comprehensive audit failed", &company_id),
    }
}

/// An empty body means defaults; anything else must decode
fn parse_audit_request(body: &[u8]) -> std::result::Result<AuditRequest, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(AuditRequest::default());
    }
    Json::<AuditRequest>::from_bytes(body)
        .map(|Json(request)| request)
        .map_err(|rejection| {
            error_response(
                rejection.status(),
                json!({ "error": "Invalid request body", "details": rejection.body_text() }),
            )
        })
}

async fn company_audit(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    body: Bytes,
) -> Response {
    let request = match parse_audit_request(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    match state.service.audit_company(&company_id, &request).await {
        Ok(audit) => (StatusCode::OK, Json(audit)).into_response(),
        Err(e) => failure_response(e, "Audit failed", &company_id),
    }
}

async fn audit_history(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let store = state.service.store();
    let listed = async {
        store.require_company(&company_id).await?;
        store
            .list_audits(&company_id, query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            .await
    };
    match listed.await {
        Ok(audits) => (StatusCode::OK, Json(audits)).into_response(),
        Err(e) => failure_response(e, "Failed to load audit history", &company_id),
    }
}

async fn get_audit(State(state): State<AppState>, Path(audit_id): Path<String>) -> Response {
    match state.service.store().get_audit(&audit_id).await {
        Ok(Some(audit)) => (StatusCode::OK, Json(audit)).into_response(),
        Ok(None) => not_found("Audit not found"),
        Err(e) => {
            error!(audit_id, error = %e, "Failed to load audit");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to load audit", "details": e.to_string() }),
            )
        }
    }
}

async fn fallback() -> Response {
    not_found("Not found")
}

/// Build the router with tracing and permissive CORS
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route(
            "/api/companies/:id/audit/comprehensive",
            post(comprehensive_audit),
        )
        .route("/api/companies/:id/audit", post(company_audit))
        .route("/api/companies/:id/audits", get(audit_history))
        .route("/api/audits/:id", get(get_audit))
        .fallback(fallback)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP API listening");
    axum::serve(listener, build_app(state)).await?;
    Ok(())
}
