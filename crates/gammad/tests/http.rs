//! Router tests against an in-process server and a stub transport.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use gamma_core::fakes::{StubReply, StubTransport};
use gamma_core::{Engine, InvokerOptions, SeedConfig, TemplateStore};
use gammad::{create_router, AppState, HealthResponse};
use serde_json::{json, Value};

fn seed() -> SeedConfig {
    serde_json::from_value(json!({
        "architecture": "Gamma Finance",
        "version": "1.0.0",
        "operators": {"modes": [
            {"n": 1, "name": "Risk Classification", "phi_factor": 0.618, "weight": 0.40},
            {"n": 2, "name": "Business Summary", "phi_factor": 0.382, "weight": 0.30},
            {"n": 3, "name": "Consistency Check", "phi_factor": 0.236, "weight": 0.30}
        ]},
        "models": {"default": "flash", "routes": {"Business Summary": "pro"}},
        "stages": [
            {"key": "risk_classification", "operator": "Risk Classification", "section": "section_1A"},
            {"key": "business_summary", "operator": "Business Summary", "section": "section_1"},
            {
                "key": "consistency_check",
                "operator": "Consistency Check",
                "section": "section_7",
                "section_placeholder": "mda_text",
                "after": {"stage": "risk_classification", "placeholder": "risks_json"}
            }
        ]
    }))
    .unwrap()
}

fn server_with(transport: StubTransport) -> TestServer {
    let templates = TemplateStore::new()
        .with_template("Risk Classification", "RISK {input_text}")
        .with_template("Business Summary", "SUMMARY {input_text}")
        .with_template("Consistency Check", "CHECK {risks_json} vs {mda_text}");
    let orchestrator = Engine::from_seed(
        seed(),
        templates,
        Arc::new(transport),
        InvokerOptions::default(),
    )
    .unwrap();
    let state = Arc::new(AppState::new(orchestrator).with_agent_name("gamma-finance-agent"));
    TestServer::new(create_router(state)).unwrap()
}

#[tokio::test]
async fn test_health_reports_operational() {
    let server = server_with(StubTransport::always("ok"));

    let response = server.get("/health").await;
    response.assert_status_ok();

    let health: HealthResponse = response.json();
    assert_eq!(health.status, "operational");
    assert_eq!(health.architecture, "Gamma Finance");
    assert_eq!(health.version, "1.0.0");
    assert_eq!(health.operators, 3);
}

#[tokio::test]
async fn test_agent_card() {
    let server = server_with(StubTransport::always("ok"));

    let response = server.post("/a2a").json(&json!({"type": "agent_card"})).await;
    response.assert_status_ok();

    let card: Value = response.json();
    assert_eq!(card["name"], "gamma-finance-agent");
    assert_eq!(card["architecture"], "Gamma Finance");
    assert_eq!(card["capabilities"]["operator_count"], 3);
    assert_eq!(card["capabilities"]["stages"], 3);
    let operators = card["capabilities"]["operators"].as_array().unwrap();
    assert_eq!(operators.len(), 3);
    assert_eq!(
        operators[0],
        json!({"name": "Risk Classification", "staging_factor": 0.618, "weight": 0.4})
    );
    assert_eq!(operators[2]["name"], "Consistency Check");
    assert_eq!(card["capabilities"]["models"], json!(["flash", "pro"]));
}

#[tokio::test]
async fn test_task_create_runs_assessment() {
    let server = server_with(StubTransport::always("analysis"));

    let response = server
        .post("/a2a")
        .json(&json!({
            "type": "task_create",
            "task": {"description": "Analyze 10-K"},
            "context": {
                "section_1A": "risk factors",
                "section_1": "business",
                "section_7": "md&a"
            }
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["type"], "task_result");
    assert_eq!(body["status"], "completed");
    assert_eq!(body["result"]["operators_executed"], 3);
    assert!((body["result"]["overall_score"].as_f64().unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(body["artifacts"][0]["type"], "json");
    assert_eq!(body["artifacts"][0]["content"], body["result"]);
}

#[tokio::test]
async fn test_task_create_ignores_non_text_context_members() {
    let server = server_with(StubTransport::always("analysis"));

    let response = server
        .post("/a2a")
        .json(&json!({
            "type": "task_create",
            "context": {
                "section_1A": "risk factors",
                "filing_year": 2023,
                "cik": null,
                "amended": false
            }
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["result"]["operators_executed"], 1);
    assert_eq!(
        body["result"]["results"]["risk_classification"]["status"],
        "success"
    );
    assert!(body["result"]["results"]["business_summary"].is_null());
}

#[tokio::test]
async fn test_missing_type_defaults_to_task_create() {
    let server = server_with(
        StubTransport::always("analysis").with_rule("SUMMARY", StubReply::Timeout),
    );

    let response = server
        .post("/a2a")
        .json(&json!({"context": {"section_1": "business"}}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let results = &body["result"]["results"];
    assert_eq!(results["business_summary"]["status"], "error");
    assert_eq!(results["business_summary"]["error_kind"], "timeout");
    assert_eq!(body["result"]["overall_score"], 0.0);
}

#[tokio::test]
async fn test_malformed_context_yields_empty_assessment() {
    let server = server_with(StubTransport::always("analysis"));

    let response = server
        .post("/a2a")
        .json(&json!({"type": "task_create", "context": "not sections"}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["result"]["results"], json!({}));
    assert_eq!(body["result"]["overall_score"], 0.0);
}

#[tokio::test]
async fn test_unknown_request_type_is_400() {
    let server = server_with(StubTransport::always("ok"));

    let response = server.post("/a2a").json(&json!({"type": "dance"})).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(
        body,
        json!({"type": "error", "message": "Unknown request type: dance"})
    );
}

#[tokio::test]
async fn test_non_json_body_is_400() {
    let server = server_with(StubTransport::always("ok"));

    let response = server.post("/a2a").text("hello").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["type"], "error");
}
