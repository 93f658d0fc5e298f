//! Runner integration tests against a local tiny_http server
//!
//! Each test spins up a `/widgets/import` handler on an ephemeral port and
//! drives it through `HttpTarget`, the same path real callers use.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use importcheck_core::{
    CaseKind, FailureKind, FieldSchema, FieldSpec, ImportFixtures, MISSING_PARAMETER_ERROR,
    VerdictStatus, build_import_cases,
};
use importcheck_runner::{HttpTarget, ImportRunner, run_import_tests};
use serde_json::{Value, json};
use tiny_http::{Header, Response, Server};

// ── Fixture server ──

type Handler = fn(&str) -> (u16, Value);

struct TestServer {
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
    base_url: String,
}

impl TestServer {
    fn start(handler: Handler) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("http server"));
        let addr = server.server_addr().to_ip().expect("ip listen addr");

        let worker = Arc::clone(&server);
        let handle = thread::spawn(move || {
            for request in worker.incoming_requests() {
                let (status, body) = handler(request.url());
                let response = Response::from_string(body.to_string())
                    .with_status_code(tiny_http::StatusCode(status))
                    .with_header(
                        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                            .expect("header"),
                    );
                let _ = request.respond(response);
            }
        });

        Self {
            server,
            handle: Some(handle),
            base_url: format!("http://{addr}"),
        }
    }

    fn target(&self) -> HttpTarget {
        HttpTarget::with_timeout(&self.base_url, Duration::from_secs(5)).expect("target")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn missing() -> (u16, Value) {
    (400, json!({ "error": MISSING_PARAMETER_ERROR }))
}

fn query_id(url: &str) -> Option<&str> {
    url.split_once('?')?.1.strip_prefix("id=")
}

/// Conforming `/widgets/import`: one widget with id 42.
fn widgets(url: &str) -> (u16, Value) {
    match query_id(url) {
        Some("42") => (200, json!([{ "id": 42, "name": "sprocket" }])),
        Some(_) => (200, json!([])),
        None => missing(),
    }
}

fn fixtures() -> ImportFixtures {
    ImportFixtures {
        valid_ids: vec!["42".into()],
        invalid_ids: vec!["999999".into()],
        fields: FieldSchema::new()
            .field("id", FieldSpec::number())
            .field("name", FieldSpec::string()),
    }
}

// ── Conforming server ──

#[test]
fn conforming_server_passes_every_case() {
    let server = TestServer::start(widgets);
    let report = run_import_tests(&server.target(), "/widgets", &fixtures());

    let urls: Vec<&str> = report.cases.iter().map(|c| c.request.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "/widgets/import?id=42",
            "/widgets/import?id=999999",
            "/widgets/import",
            "/widgets/import?i%20d%3D42",
            "/widgets/import?iid%3D42",
        ]
    );
    report.assert_passed();

    let verdict = report.verdict();
    assert_eq!(verdict.status, VerdictStatus::Pass);
    assert_eq!(verdict.exit_code, 0);
}

#[test]
fn repeated_valid_query_is_idempotent() {
    let server = TestServer::start(widgets);
    let target = server.target();
    let first = run_import_tests(&target, "/widgets", &fixtures());
    let second = run_import_tests(&target, "/widgets", &fixtures());

    let status_and_body = |r: &importcheck_core::SuiteReport| {
        r.cases
            .iter()
            .map(|c| c.response.clone().map(|resp| (resp.status_code, resp.body)))
            .collect::<Vec<_>>()
    };
    assert_eq!(status_and_body(&first), status_and_body(&second));
}

#[test]
fn nullable_field_accepts_null() {
    fn with_note(url: &str) -> (u16, Value) {
        match query_id(url) {
            Some("42") => (200, json!([{ "id": 42, "name": "sprocket", "note": null }])),
            Some(_) => (200, json!([])),
            None => missing(),
        }
    }
    let server = TestServer::start(with_note);
    let mut fixtures = fixtures();
    fixtures.fields = fixtures
        .fields
        .field("note", FieldSpec::string().nullable());

    run_import_tests(&server.target(), "/widgets", &fixtures).assert_passed();
}

// ── Contract violations ──

#[test]
fn extra_key_fails_only_valid_id_case() {
    fn extra_key(url: &str) -> (u16, Value) {
        match query_id(url) {
            Some("42") => (200, json!([{ "id": 42, "name": "sprocket", "color": "red" }])),
            _ => widgets(url),
        }
    }
    let server = TestServer::start(extra_key);
    let report = run_import_tests(&server.target(), "/widgets", &fixtures());

    assert_eq!(report.passed_count(), 4);
    let failed = &report.cases[0];
    assert_eq!(failed.kind, CaseKind::ValidId);
    assert_eq!(failed.failures.len(), 1);
    assert_eq!(failed.failures[0].kind, FailureKind::ShapeMismatch);
    assert!(failed.failures[0].message.starts_with("item[0]:"));
    assert_eq!(report.verdict().exit_code, 1);
}

#[test]
fn string_id_is_type_mismatch() {
    fn string_id(url: &str) -> (u16, Value) {
        match query_id(url) {
            Some("42") => (200, json!([{ "id": "42", "name": "sprocket" }])),
            _ => widgets(url),
        }
    }
    let server = TestServer::start(string_id);
    let report = run_import_tests(&server.target(), "/widgets", &fixtures());

    let case = report
        .case("Query with valid id '42' gives proper results")
        .expect("valid id case");
    assert_eq!(case.failures[0].kind, FailureKind::TypeMismatch);
    assert_eq!(
        case.failures[0].message,
        "item[0]: field 'id' should be number, got string"
    );
}

#[test]
fn null_in_non_nullable_field_is_reported() {
    fn null_name(url: &str) -> (u16, Value) {
        match query_id(url) {
            Some("42") => (200, json!([{ "id": 42, "name": null }])),
            _ => widgets(url),
        }
    }
    let server = TestServer::start(null_name);
    let report = run_import_tests(&server.target(), "/widgets", &fixtures());
    assert_eq!(
        report.cases[0].failures[0].kind,
        FailureKind::NullabilityViolation
    );
}

#[test]
fn missing_parameter_answered_with_200_fails() {
    fn lax(url: &str) -> (u16, Value) {
        match query_id(url) {
            None => (200, json!([])),
            _ => widgets(url),
        }
    }
    let server = TestServer::start(lax);
    let report = run_import_tests(&server.target(), "/widgets", &fixtures());

    let kinds: Vec<CaseKind> = report.failed_cases().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            CaseKind::MissingParameter,
            CaseKind::MalformedQuery,
            CaseKind::MalformedQuery,
        ]
    );
    let missing_case = report.case("Error when no query").expect("missing case");
    assert_eq!(missing_case.failures[0].kind, FailureKind::UnexpectedStatus);
    assert_eq!(missing_case.failures[0].message, "expected 400, got 200");
    assert_eq!(missing_case.failures[1].kind, FailureKind::UnexpectedBodyShape);
}

#[test]
fn lenient_key_matching_fails_duplicate_case() {
    /// Accepts any key ending in "id", so "iid=42" resolves like "id=42".
    fn lenient(url: &str) -> (u16, Value) {
        let Some((_, query)) = url.split_once('?') else {
            return missing();
        };
        let decoded = query.replace("%3D", "=").replace("%20", " ");
        match decoded.split_once('=') {
            Some((key, value)) if key.ends_with("id") && !key.contains(' ') => {
                widgets(&format!("/widgets/import?id={value}"))
            }
            _ => missing(),
        }
    }
    let server = TestServer::start(lenient);
    let report = run_import_tests(&server.target(), "/widgets", &fixtures());

    let failed: Vec<&str> = report.failed_cases().map(|c| c.name.as_str()).collect();
    assert_eq!(failed, vec!["Error with query 'iid=42'"]);
}

#[test]
fn empty_result_for_valid_id_fails() {
    fn empty(url: &str) -> (u16, Value) {
        match query_id(url) {
            Some(_) => (200, json!([])),
            None => missing(),
        }
    }
    let server = TestServer::start(empty);
    let report = run_import_tests(&server.target(), "/widgets", &fixtures());
    assert_eq!(report.cases[0].failures[0].kind, FailureKind::UnexpectedBodyShape);
    assert_eq!(report.passed_count(), 4);
}

// ── Transport and execution modes ──

#[test]
fn unreachable_server_reports_transport_errors() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let target =
        HttpTarget::with_timeout(format!("http://127.0.0.1:{port}"), Duration::from_secs(1))
            .expect("target");
    let report = run_import_tests(&target, "/widgets", &fixtures());

    assert_eq!(report.total(), 5);
    assert!(report.cases.iter().all(|c| c.response.is_none()
        && c.failures.len() == 1
        && c.failures[0].kind == FailureKind::TransportError));

    let verdict = report.verdict();
    assert_eq!(verdict.exit_code, 3);
    assert_eq!(verdict.reason, "5 cases got no response");
}

#[test]
fn parallel_run_matches_sequential_order() {
    let server = TestServer::start(widgets);
    let target = server.target();
    let cases = build_import_cases("/widgets", &fixtures());

    let sequential = ImportRunner::new(&target).run_cases("/widgets/import", &cases);
    let parallel = ImportRunner::new(&target)
        .with_parallel(true)
        .run_cases("/widgets/import", &cases);

    let names = |r: &importcheck_core::SuiteReport| {
        r.cases.iter().map(|c| c.name.clone()).collect::<Vec<_>>()
    };
    assert_eq!(names(&sequential), names(&parallel));
    parallel.assert_passed();
}

#[test]
#[should_panic(expected = "1 of 5 cases failed")]
fn assert_passed_panics_on_failed_case() {
    fn extra_key(url: &str) -> (u16, Value) {
        match query_id(url) {
            Some("42") => (200, json!([{ "id": 42 }])),
            _ => widgets(url),
        }
    }
    let server = TestServer::start(extra_key);
    run_import_tests(&server.target(), "/widgets", &fixtures()).assert_passed();
}
