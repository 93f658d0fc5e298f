//! Case execution against an [`ImportServer`]
//!
//! One GET per case, then the pure checks in [`checks`] over the response.
//! A failed case never stops its siblings.

mod checks;

use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use importcheck_core::{
    CaseFailure, CaseOutcome, EndpointFixtures, FailureKind, ImportFixtures, RequestSnapshot,
    ResponseSnapshot, SuiteReport, TestCase, build_endpoint_cases, build_import_cases,
    suite::import_endpoint,
};

use crate::server::ImportServer;

use checks::{CheckInput, run_checks};

/// Response bodies longer than this are truncated in snapshots.
const MAX_BODY_BYTES: usize = 4096;

/// Message recorded when the server adapter panics instead of answering.
const ADAPTER_PANICKED: &str = "server adapter panicked";

/// Runs generated cases against one server.
pub struct ImportRunner<'a, S: ImportServer + ?Sized> {
    server: &'a S,
    parallel: bool,
    max_threads: Option<NonZeroUsize>,
}

impl<'a, S: ImportServer + ?Sized> ImportRunner<'a, S> {
    #[must_use]
    pub fn new(server: &'a S) -> Self {
        Self {
            server,
            parallel: false,
            max_threads: None,
        }
    }

    /// Issue cases from scoped threads, at most `max_threads` at a time.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Cap on concurrent requests in parallel mode.
    ///
    /// Defaults to [`std::thread::available_parallelism`].
    #[must_use]
    pub fn with_max_threads(mut self, max_threads: NonZeroUsize) -> Self {
        self.max_threads = Some(max_threads);
        self
    }

    /// Run `cases` and collect their outcomes in declaration order.
    pub fn run_cases(&self, endpoint: &str, cases: &[TestCase]) -> SuiteReport {
        let outcomes = if self.parallel && cases.len() > 1 {
            self.run_parallel(cases)
        } else {
            cases.iter().map(|case| self.execute_one(case)).collect()
        };

        let report = SuiteReport {
            endpoint: endpoint.to_string(),
            cases: outcomes,
        };
        tracing::info!(
            endpoint,
            total = report.total(),
            passed = report.passed_count(),
            "suite finished"
        );
        report
    }

    fn run_parallel(&self, cases: &[TestCase]) -> Vec<CaseOutcome> {
        let width = self
            .max_threads
            .or_else(|| std::thread::available_parallelism().ok())
            .map_or(1, NonZeroUsize::get);

        let mut outcomes = Vec::with_capacity(cases.len());
        for chunk in cases.chunks(width) {
            std::thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|case| scope.spawn(move || self.execute_one(case)))
                    .collect();

                outcomes.extend(handles.into_iter().zip(chunk).map(|(handle, case)| {
                    handle.join().unwrap_or_else(|_| {
                        let outcome = panicked_outcome(case, request_snapshot(case));
                        log_failure(&outcome);
                        outcome
                    })
                }));
            });
        }
        outcomes
    }

    fn execute_one(&self, case: &TestCase) -> CaseOutcome {
        let request = request_snapshot(case);
        tracing::debug!(case = %case.name, url = %request.url, "GET");

        let start = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.server.get(&request.url)));
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let outcome = match result {
            Ok(Ok(resp)) => {
                let failures = run_checks(&CheckInput {
                    status_code: resp.status,
                    body_text: &resp.body,
                    expectation: &case.expectation,
                });
                CaseOutcome {
                    name: case.name.clone(),
                    kind: case.kind,
                    request,
                    response: Some(ResponseSnapshot {
                        status_code: resp.status,
                        body: truncate_body(&resp.body),
                        latency_ms,
                    }),
                    failures,
                }
            }
            Ok(Err(e)) => CaseOutcome {
                name: case.name.clone(),
                kind: case.kind,
                request,
                response: None,
                failures: vec![CaseFailure::new(FailureKind::TransportError, e.to_string())],
            },
            Err(_) => panicked_outcome(case, request),
        };

        if !outcome.passed() {
            log_failure(&outcome);
        }
        outcome
    }
}

fn request_snapshot(case: &TestCase) -> RequestSnapshot {
    RequestSnapshot {
        method: "GET".to_string(),
        url: case.path_and_query(),
    }
}

fn panicked_outcome(case: &TestCase, request: RequestSnapshot) -> CaseOutcome {
    CaseOutcome {
        name: case.name.clone(),
        kind: case.kind,
        request,
        response: None,
        failures: vec![CaseFailure::new(FailureKind::TransportError, ADAPTER_PANICKED)],
    }
}

fn log_failure(outcome: &CaseOutcome) {
    tracing::warn!(
        case = %outcome.name,
        url = %outcome.request.url,
        failures = outcome.failures.len(),
        "case failed"
    );
}

fn truncate_body(body: &str) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    if body.len() <= MAX_BODY_BYTES {
        return Some(body.to_string());
    }
    let mut end = MAX_BODY_BYTES;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    Some(format!("{}…({} bytes total)", &body[..end], body.len()))
}

/// Run every generated case for `endpoint` sequentially.
pub fn run_endpoint_tests<S: ImportServer + ?Sized>(
    server: &S,
    endpoint: &str,
    fixtures: &EndpointFixtures,
) -> SuiteReport {
    let cases = build_endpoint_cases(endpoint, fixtures);
    ImportRunner::new(server).run_cases(endpoint, &cases)
}

/// Run the import-endpoint suite against `{endpoint_base}/import` sequentially.
///
/// ```no_run
/// use importcheck_core::{FieldSchema, FieldSpec, ImportFixtures};
/// use importcheck_runner::{HttpTarget, run_import_tests};
///
/// let server = HttpTarget::new("http://localhost:3000").unwrap();
/// let fixtures = ImportFixtures {
///     valid_ids: vec!["42".into()],
///     invalid_ids: vec!["999999".into()],
///     fields: FieldSchema::new()
///         .field("id", FieldSpec::number())
///         .field("name", FieldSpec::string()),
/// };
/// run_import_tests(&server, "/widgets", &fixtures).assert_passed();
/// ```
pub fn run_import_tests<S: ImportServer + ?Sized>(
    server: &S,
    endpoint_base: &str,
    fixtures: &ImportFixtures,
) -> SuiteReport {
    let cases = build_import_cases(endpoint_base, fixtures);
    ImportRunner::new(server).run_cases(&import_endpoint(endpoint_base), &cases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{HttpResponse, TransportError, server_fn};
    use importcheck_core::{CaseKind, FieldSchema, FieldSpec, MISSING_PARAMETER_ERROR};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn fixtures() -> ImportFixtures {
        ImportFixtures {
            valid_ids: vec!["42".into()],
            invalid_ids: vec!["999999".into()],
            fields: FieldSchema::new()
                .field("id", FieldSpec::number())
                .field("name", FieldSpec::string()),
        }
    }

    /// In-process stand-in for a conforming `/widgets/import`.
    fn widget_route(path: &str) -> Result<HttpResponse, TransportError> {
        let missing = HttpResponse::json(400, &json!({"error": MISSING_PARAMETER_ERROR}));
        let Some((_, query)) = path.split_once('?') else {
            return Ok(missing);
        };
        match query.strip_prefix("id=") {
            Some("42") => Ok(HttpResponse::json(
                200,
                &json!([{"id": 42, "name": "sprocket"}]),
            )),
            Some(_) => Ok(HttpResponse::json(200, &json!([]))),
            None => Ok(missing),
        }
    }

    #[test]
    fn conforming_server_passes() {
        let server = server_fn(widget_route);
        let report = run_import_tests(&server, "/widgets", &fixtures());
        assert_eq!(report.endpoint, "/widgets/import");
        assert_eq!(report.total(), 5);
        report.assert_passed();
    }

    #[test]
    fn outcomes_carry_request_and_response() {
        let server = server_fn(widget_route);
        let report = run_import_tests(&server, "/widgets", &fixtures());
        let case = &report.cases[0];
        assert_eq!(case.kind, CaseKind::ValidId);
        assert_eq!(case.request.method, "GET");
        assert_eq!(case.request.url, "/widgets/import?id=42");
        let resp = case.response.as_ref().unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body.as_deref(), Some(r#"[{"id":42,"name":"sprocket"}]"#));
    }

    #[test]
    fn transport_error_is_isolated_to_its_case() {
        let server = server_fn(|path| {
            if path.ends_with("999999") {
                Err(TransportError::Request("connection reset".into()))
            } else {
                widget_route(path)
            }
        });
        let report = run_import_tests(&server, "/widgets", &fixtures());
        assert_eq!(report.passed_count(), 4);
        let failed: Vec<&CaseOutcome> = report.failed_cases().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].kind, CaseKind::NonExistentId);
        assert!(failed[0].response.is_none());
        assert_eq!(failed[0].failures[0].kind, FailureKind::TransportError);
        assert_eq!(report.verdict().exit_code, 3);
    }

    #[test]
    fn parallel_run_keeps_declaration_order() {
        let server = server_fn(widget_route);
        let cases = build_import_cases("/widgets", &fixtures());
        let sequential = ImportRunner::new(&server).run_cases("/widgets/import", &cases);
        let parallel = ImportRunner::new(&server)
            .with_parallel(true)
            .run_cases("/widgets/import", &cases);

        let names = |r: &SuiteReport| r.cases.iter().map(|c| c.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&sequential), names(&parallel));
        assert!(parallel.passed());
    }

    fn panics_on_unknown_id(path: &str) -> Result<HttpResponse, TransportError> {
        if path.contains("999999") {
            panic!("adapter bug");
        }
        widget_route(path)
    }

    #[test]
    fn panicking_adapter_fails_only_its_case() {
        let server = server_fn(panics_on_unknown_id);
        let cases = build_import_cases("/widgets", &fixtures());
        let report = ImportRunner::new(&server)
            .with_parallel(true)
            .run_cases("/widgets/import", &cases);
        assert_eq!(report.passed_count(), 4);
        assert_eq!(report.cases[1].failures[0].message, ADAPTER_PANICKED);
    }

    #[test]
    fn panicking_adapter_is_isolated_when_sequential() {
        let server = server_fn(panics_on_unknown_id);
        let report = run_import_tests(&server, "/widgets", &fixtures());
        assert_eq!(report.total(), 5);
        assert_eq!(report.passed_count(), 4);
        let failed = &report.cases[1];
        assert_eq!(failed.kind, CaseKind::NonExistentId);
        assert!(failed.response.is_none());
        assert_eq!(failed.failures[0].kind, FailureKind::TransportError);
        assert_eq!(failed.failures[0].message, ADAPTER_PANICKED);
    }

    #[test]
    fn parallel_run_respects_thread_cap() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let server = server_fn(|path| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            widget_route(path)
        });
        let fixtures = ImportFixtures {
            invalid_ids: (0..8).map(|i| format!("9999{i}")).collect(),
            ..fixtures()
        };
        let cases = build_import_cases("/widgets", &fixtures);
        let report = ImportRunner::new(&server)
            .with_parallel(true)
            .with_max_threads(NonZeroUsize::new(2).unwrap())
            .run_cases("/widgets/import", &cases);

        assert_eq!(report.total(), 12);
        assert!(report.passed());
        assert!(peak.load(Ordering::SeqCst) <= 2);
        let names: Vec<&str> = report.cases.iter().map(|c| c.name.as_str()).collect();
        let expected: Vec<&str> = cases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn endpoint_tests_accept_explicit_invalid_queries() {
        let server = server_fn(widget_route);
        let fixtures = EndpointFixtures {
            invalid_queries: vec!["ID=42".into()],
            ..EndpointFixtures::default()
        };
        let report = run_endpoint_tests(&server, "/widgets/import", &fixtures);
        assert_eq!(report.total(), 2);
        assert_eq!(report.cases[1].request.url, "/widgets/import?ID%3D42");
        report.assert_passed();
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(MAX_BODY_BYTES + 10);
        let stored = truncate_body(&body).unwrap();
        assert!(stored.starts_with(&"x".repeat(MAX_BODY_BYTES)));
        assert!(stored.ends_with(&format!("({} bytes total)", MAX_BODY_BYTES + 10)));
        assert_eq!(truncate_body(""), None);
    }
}
