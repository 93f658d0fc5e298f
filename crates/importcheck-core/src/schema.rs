//! JSON Schema export for the config file and report formats

use crate::Config;
use crate::verdict::SuiteReport;

/// JSON Schema of the config file format.
#[must_use]
pub fn generate_config_schema() -> String {
    let schema = schemars::schema_for!(Config);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}

/// JSON Schema of the `--output json` report.
#[must_use]
pub fn generate_report_schema() -> String {
    let schema = schemars::schema_for!(SuiteReport);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}
