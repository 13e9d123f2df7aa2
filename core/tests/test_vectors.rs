//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results or error classes. Comparing parsed JSON (not
//! raw strings) avoids false negatives from field-ordering differences.

use projectpro_core::{
    ApiClient, ApiError, CreateProject, Credential, HttpMethod, HttpRequest, HttpResponse,
    KanbanBoard, Project, Task, TaskStatus,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:8000";

fn client() -> ApiClient {
    ApiClient::new(BASE_URL)
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn cases(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

fn token(case: &Value) -> Credential {
    Credential::new(case["token"].as_str().unwrap())
}

/// Check method, full URL and exact header list against `expected_request`.
fn assert_request_line(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.path, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: path");

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();
    assert_eq!(req.headers, expected_headers, "{name}: headers");
}

fn simulated_response(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

/// Match an error against `{"kind": ..., "status": ...}`.
fn assert_error_class(name: &str, err: &ApiError, expected: &Value) {
    match expected["kind"].as_str().unwrap() {
        "Auth" => assert!(matches!(err, ApiError::Auth(_)), "{name}: expected Auth, got {err:?}"),
        "Validation" => {
            assert!(matches!(err, ApiError::Validation(_)), "{name}: expected Validation, got {err:?}")
        }
        "Request" => {
            let status = expected["status"].as_u64().map(|s| s as u16);
            assert!(matches!(err, ApiError::Request { .. }), "{name}: expected Request, got {err:?}");
            assert_eq!(err.status(), status, "{name}: status");
        }
        other => panic!("{name}: unknown expected error kind: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[test]
fn login_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/login.json")) {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let expected_req = &case["expected_request"];

        // Verify build
        let req = c.build_login(
            input["username"].as_str().unwrap(),
            input["password"].as_str().unwrap(),
        );
        assert_request_line(name, &req, expected_req);
        assert_eq!(req.body.as_deref(), expected_req["body"].as_str(), "{name}: body");

        // Verify parse
        let result = c.parse_login(simulated_response(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error_class(name, &result.unwrap_err(), expected_error);
        } else {
            let credential = result.unwrap();
            assert_eq!(credential.expose(), case["expected_result"].as_str().unwrap(), "{name}: token");
        }
    }
}

// ---------------------------------------------------------------------------
// Create project
// ---------------------------------------------------------------------------

#[test]
fn create_project_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/create_project.json")) {
        let name = case["name"].as_str().unwrap();
        let input: CreateProject = serde_json::from_value(case["input"].clone()).unwrap();
        let expected_req = &case["expected_request"];

        // Verify build
        let req = c.build_create_project(&input, &token(&case)).unwrap();
        assert_request_line(name, &req, expected_req);
        let req_body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(req_body, expected_req["body"], "{name}: body");

        // Verify parse
        let result = c.parse_create_project(simulated_response(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error_class(name, &result.unwrap_err(), expected_error);
        } else {
            let expected: Project = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// List tasks
// ---------------------------------------------------------------------------

#[test]
fn list_tasks_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/list_tasks.json")) {
        let name = case["name"].as_str().unwrap();
        let project_id = case["input_project_id"].as_i64();

        // Verify build
        let req = c.build_list_tasks(&token(&case), project_id);
        assert_request_line(name, &req, &case["expected_request"]);
        assert!(req.body.is_none(), "{name}: body should be None");

        // Verify parse
        let result = c.parse_list_tasks(simulated_response(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error_class(name, &result.unwrap_err(), expected_error);
        } else {
            let expected: Vec<Task> = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Kanban
// ---------------------------------------------------------------------------

#[test]
fn kanban_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/kanban.json")) {
        let name = case["name"].as_str().unwrap();
        let project_id = case["input_project_id"].as_i64().unwrap();

        // Verify build
        let req = c.build_kanban_tasks(project_id, &token(&case));
        assert_request_line(name, &req, &case["expected_request"]);
        assert!(req.body.is_none(), "{name}: body should be None");

        // Verify parse
        let result = c.parse_kanban_tasks(simulated_response(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error_class(name, &result.unwrap_err(), expected_error);
            continue;
        }
        let board: KanbanBoard = result.unwrap();
        let expected = &case["expected_columns"];
        for status in TaskStatus::ALL {
            let ids: Vec<i64> = board.column(status).iter().map(|card| card.id).collect();
            let expected_ids: Vec<i64> = serde_json::from_value(expected[status.label()].clone()).unwrap();
            assert_eq!(ids, expected_ids, "{name}: column {}", status.label());
        }
    }
}

// ---------------------------------------------------------------------------
// Delete task
// ---------------------------------------------------------------------------

#[test]
fn delete_task_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/delete_task.json")) {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_i64().unwrap();

        // Verify build
        let req = c.build_delete_task(id, &token(&case));
        assert_request_line(name, &req, &case["expected_request"]);
        assert!(req.body.is_none(), "{name}: body should be None");

        // Verify parse
        let result = c.parse_delete_task(simulated_response(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error_class(name, &result.unwrap_err(), expected_error);
        } else {
            assert!(result.is_ok(), "{name}: expected success");
        }
    }
}
