//! Verdict module - failure classification, case outcomes and pass/fail

mod failure;
mod judge;

pub use failure::{CaseFailure, FailureKind, RequestSnapshot, ResponseSnapshot};
pub use judge::{CaseOutcome, SuiteReport, Verdict, VerdictStatus};
