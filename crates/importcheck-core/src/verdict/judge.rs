//! Case outcomes, suite reports and the final verdict

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{CaseFailure, FailureKind, RequestSnapshot, ResponseSnapshot};
use crate::suite::CaseKind;

/// Result of running one case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CaseOutcome {
    pub name: String,
    pub kind: CaseKind,
    pub request: RequestSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSnapshot>,
    #[serde(default)]
    pub failures: Vec<CaseFailure>,
}

impl CaseOutcome {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    fn is_transport_only(&self) -> bool {
        !self.failures.is_empty()
            && self
                .failures
                .iter()
                .all(|f| f.kind == FailureKind::TransportError)
    }
}

/// Every case outcome of one suite run, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SuiteReport {
    pub endpoint: String,
    pub cases: Vec<CaseOutcome>,
}

impl SuiteReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.cases.len()
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    /// True when at least one case ran and none failed.
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.cases.is_empty() && self.cases.iter().all(CaseOutcome::passed)
    }

    pub fn failed_cases(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.cases.iter().filter(|c| !c.passed())
    }

    #[must_use]
    pub fn case(&self, name: &str) -> Option<&CaseOutcome> {
        self.cases.iter().find(|c| c.name == name)
    }

    /// Plain-text listing of every failed case.
    #[must_use]
    pub fn failure_summary(&self) -> String {
        let mut lines = Vec::new();
        for case in self.failed_cases() {
            lines.push(format!("✗ {} ({})", case.name, case.request.url));
            for f in &case.failures {
                lines.push(format!("    {f}"));
            }
        }
        lines.join("\n")
    }

    /// Panic with every failed case when the suite did not pass.
    ///
    /// Intended as the last line of a `#[test]` function.
    ///
    /// # Panics
    ///
    /// Panics if any case failed or no case ran.
    #[track_caller]
    pub fn assert_passed(&self) {
        if self.cases.is_empty() {
            panic!("{}: no cases were run", self.endpoint);
        }
        if !self.passed() {
            panic!(
                "{}: {} of {} cases failed\n{}",
                self.endpoint,
                self.total() - self.passed_count(),
                self.total(),
                self.failure_summary()
            );
        }
    }

    /// Judge the whole run.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        let total = self.total();
        if total == 0 {
            return Verdict {
                status: VerdictStatus::Fail,
                exit_code: 3,
                reason: "No cases were run".to_string(),
            };
        }

        let failed: Vec<&CaseOutcome> = self.failed_cases().collect();
        if failed.is_empty() {
            return Verdict {
                status: VerdictStatus::Pass,
                exit_code: 0,
                reason: format!("All {total} cases passed"),
            };
        }

        let transport = failed.iter().filter(|c| c.is_transport_only()).count();
        let asserted = failed.len() - transport;

        let mut parts = Vec::new();
        if asserted > 0 {
            parts.push(format!("{asserted} of {total} cases failed"));
        }
        if transport > 0 {
            parts.push(format!("{transport} cases got no response"));
        }

        // Only transport errors → tool error, the contract was never checked
        let exit_code = if asserted > 0 { 1 } else { 3 };

        Verdict {
            status: VerdictStatus::Fail,
            exit_code,
            reason: parts.join("; "),
        }
    }
}

/// Final verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub exit_code: i32,
    pub reason: String,
}

/// Pass or fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}
