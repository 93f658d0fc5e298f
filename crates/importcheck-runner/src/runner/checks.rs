//! Response validation checks
//!
//! No I/O. Status, body shape and item shape are checked independently so a
//! single response reports every way it breaks the contract.

use serde_json::Value;

use importcheck_core::field::kind_of;
use importcheck_core::{BodyExpectation, CaseFailure, Expectation, FailureKind, validate_all};

/// Item-level failures reported per case before truncating.
const MAX_ITEM_FAILURES: usize = 20;

/// Input for response validation checks.
pub(super) struct CheckInput<'a> {
    pub(super) status_code: u16,
    pub(super) body_text: &'a str,
    pub(super) expectation: &'a Expectation,
}

/// Run status and body checks for one response.
pub(super) fn run_checks(input: &CheckInput) -> Vec<CaseFailure> {
    let mut failures = Vec::new();

    // ── Check 1: status code ──
    if input.status_code != input.expectation.status {
        failures.push(CaseFailure::new(
            FailureKind::UnexpectedStatus,
            format!(
                "expected {}, got {}",
                input.expectation.status, input.status_code
            ),
        ));
    }

    // ── Check 2: body parses ──
    let body = match serde_json::from_str::<Value>(input.body_text) {
        Ok(v) => v,
        Err(_) => {
            failures.push(CaseFailure::new(
                FailureKind::UnexpectedBodyShape,
                format!("body is not valid JSON: {}", preview(input.body_text)),
            ));
            return failures;
        }
    };

    // ── Check 3: body shape ──
    match &input.expectation.body {
        BodyExpectation::Items { fields } => match body.as_array() {
            None => failures.push(not_an_array(&body)),
            Some(items) if items.is_empty() => failures.push(CaseFailure::new(
                FailureKind::UnexpectedBodyShape,
                "expected a non-empty array, got []",
            )),
            Some(items) => {
                let mut item_failures = items
                    .iter()
                    .enumerate()
                    .flat_map(|(i, item)| {
                        validate_all(fields, item)
                            .into_iter()
                            .map(move |e| CaseFailure::from_shape(i, &e))
                    })
                    .collect::<Vec<_>>();
                let extra = item_failures.len().saturating_sub(MAX_ITEM_FAILURES);
                item_failures.truncate(MAX_ITEM_FAILURES);
                failures.extend(item_failures);
                if extra > 0 {
                    failures.push(CaseFailure::new(
                        FailureKind::UnexpectedBodyShape,
                        format!("... and {extra} more item violations"),
                    ));
                }
            }
        },
        BodyExpectation::EmptyArray => match body.as_array() {
            None => failures.push(not_an_array(&body)),
            Some(items) if !items.is_empty() => failures.push(CaseFailure::new(
                FailureKind::UnexpectedBodyShape,
                format!("expected an empty array, got {} items", items.len()),
            )),
            Some(_) => {}
        },
        BodyExpectation::Error { message } => match body.get("error") {
            None => failures.push(CaseFailure::new(
                FailureKind::UnexpectedBodyShape,
                format!("body has no 'error' key: {}", preview(input.body_text)),
            )),
            Some(Value::String(actual)) if actual == message => {}
            Some(other) => failures.push(CaseFailure::new(
                FailureKind::UnexpectedBodyShape,
                format!("error is {other}, expected \"{message}\""),
            )),
        },
    }

    failures
}

fn not_an_array(body: &Value) -> CaseFailure {
    CaseFailure::new(
        FailureKind::UnexpectedBodyShape,
        format!("expected an array, got {}", kind_of(body)),
    )
}

/// First 200 bytes of a body, cut on a char boundary.
fn preview(text: &str) -> &str {
    let mut end = text.len().min(200);
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
