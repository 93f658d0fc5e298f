//! importcheck-core: Field schemas, query mutation and case generation
//!
//! This crate holds the pure half of the import endpoint harness: the
//! declarative field schema and its validator, the malformed-query mutator,
//! case enumeration, and the types used to report and judge a run.

pub mod config;
pub mod dryrun;
pub mod field;
pub mod generator;
pub mod mutate;
pub mod schema;
pub mod suite;
pub mod validate;
pub mod verdict;

pub use config::{Config, ConfigError};
pub use dryrun::DryRunPlan;
pub use field::{FieldKind, FieldSchema, FieldSpec};
pub use generator::to_http_file;
pub use mutate::{Mutation, destroy, malformed_queries};
pub use suite::{
    BodyExpectation, CaseKind, EndpointFixtures, Expectation, ImportFixtures,
    MISSING_PARAMETER_ERROR, SuiteBuilder, TestCase, build_endpoint_cases, build_import_cases,
};
pub use validate::{ShapeError, validate, validate_all};
pub use verdict::{
    CaseFailure, CaseOutcome, FailureKind, RequestSnapshot, ResponseSnapshot, SuiteReport,
    Verdict, VerdictStatus,
};
