//! Dry run plan types and config validation
//!
//! Describes which requests a run *would* send without sending any.
//! Used for pre-flight validation and CI previews.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Config;
use crate::suite::{CaseKind, build_import_cases, import_endpoint};

// ── Plan types ──

/// Complete dry run plan: cases, request count, and config warnings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DryRunPlan {
    /// Endpoint under test, e.g. "/widgets/import"
    pub endpoint: String,
    /// Planned cases in execution order
    pub cases: Vec<PlannedCase>,
    /// Total requests that would be sent
    pub total_requests: u64,
    /// Config validation results
    pub validations: Vec<Validation>,
}

/// A single planned request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlannedCase {
    pub name: String,
    pub kind: CaseKind,
    /// Path and query, e.g. "/widgets/import?id=42"
    pub request: String,
    pub expected_status: u16,
}

/// A validation check result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub check: String,
    pub status: ValidationStatus,
    pub message: String,
}

/// Status of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl DryRunPlan {
    /// Enumerate the cases a config would run and validate the config.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let cases: Vec<PlannedCase> = build_import_cases(&config.endpoint, &config.fixtures())
            .into_iter()
            .map(|c| PlannedCase {
                request: c.path_and_query(),
                expected_status: c.expectation.status,
                name: c.name,
                kind: c.kind,
            })
            .collect();

        Self {
            endpoint: import_endpoint(&config.endpoint),
            total_requests: u64::try_from(cases.len()).unwrap_or(u64::MAX),
            cases,
            validations: validate_config(config),
        }
    }
}

// ── Config validation ──

/// Patterns that suggest a placeholder value rather than a real credential.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-token",
    "your_token",
    "YOUR_TOKEN",
    "your-api-key",
    "YOUR_API_KEY",
    "CHANGEME",
    "changeme",
    "placeholder",
    "REPLACE_ME",
];

/// Validate config and produce validation results.
#[must_use]
pub fn validate_config(config: &Config) -> Vec<Validation> {
    let mut checks = Vec::new();

    // Base URL
    if config.base_url.starts_with("http://") || config.base_url.starts_with("https://") {
        checks.push(Validation {
            check: "base_url".into(),
            status: ValidationStatus::Ok,
            message: format!("base_url: {}", config.base_url),
        });
    } else {
        checks.push(Validation {
            check: "base_url".into(),
            status: ValidationStatus::Warning,
            message: format!(
                "base_url: {} (missing http:// or https:// prefix)",
                config.base_url
            ),
        });
    }

    // Endpoint path
    if config.endpoint.starts_with('/') {
        checks.push(Validation {
            check: "endpoint".into(),
            status: ValidationStatus::Ok,
            message: format!("endpoint: {}", import_endpoint(&config.endpoint)),
        });
    } else {
        checks.push(Validation {
            check: "endpoint".into(),
            status: ValidationStatus::Error,
            message: format!("endpoint: {} (must start with '/')", config.endpoint),
        });
    }

    // Ids
    if config.valid_ids.is_empty() {
        checks.push(Validation {
            check: "valid_ids".into(),
            status: ValidationStatus::Warning,
            message: "valid_ids: none (result shape not tested, malformed queries use an empty id)".into(),
        });
    } else {
        checks.push(Validation {
            check: "valid_ids".into(),
            status: ValidationStatus::Ok,
            message: format!("valid_ids: {}", config.valid_ids.len()),
        });
    }

    if config.invalid_ids.is_empty() {
        checks.push(Validation {
            check: "invalid_ids".into(),
            status: ValidationStatus::Warning,
            message: "invalid_ids: none (empty result not tested)".into(),
        });
    } else {
        checks.push(Validation {
            check: "invalid_ids".into(),
            status: ValidationStatus::Ok,
            message: format!("invalid_ids: {}", config.invalid_ids.len()),
        });
    }

    let overlap: Vec<&String> = config
        .valid_ids
        .iter()
        .filter(|id| config.invalid_ids.contains(id))
        .collect();
    for id in overlap {
        checks.push(Validation {
            check: "ids".into(),
            status: ValidationStatus::Error,
            message: format!("id '{id}' is listed as both valid and invalid"),
        });
    }

    // Fields
    if config.fields.is_empty() {
        let status = if config.valid_ids.is_empty() {
            ValidationStatus::Ok
        } else {
            ValidationStatus::Warning
        };
        checks.push(Validation {
            check: "fields".into(),
            status,
            message: "fields: none (items must be empty objects)".into(),
        });
    } else {
        let nullable = config.fields.iter().filter(|(_, s)| s.nullable).count();
        checks.push(Validation {
            check: "fields".into(),
            status: ValidationStatus::Ok,
            message: format!(
                "fields: {} declared ({nullable} nullable)",
                config.fields.len()
            ),
        });
    }

    // Headers: placeholder values
    if !config.headers.is_empty() {
        let mut header_issues = Vec::new();
        let mut names: Vec<&String> = config.headers.keys().collect();
        names.sort();
        for key in names {
            let value = &config.headers[key];
            if value.contains('<') && value.contains('>') {
                header_issues.push(format!("{key}: contains '<...>' placeholder"));
            }
            for pattern in PLACEHOLDER_PATTERNS {
                if value.contains(pattern) {
                    header_issues.push(format!("{key}: contains '{pattern}', may be a placeholder"));
                    break;
                }
            }
        }

        if header_issues.is_empty() {
            checks.push(Validation {
                check: "headers".into(),
                status: ValidationStatus::Ok,
                message: format!("headers: {} configured", config.headers.len()),
            });
        } else {
            for issue in header_issues {
                checks.push(Validation {
                    check: "headers".into(),
                    status: ValidationStatus::Warning,
                    message: issue,
                });
            }
        }
    }

    checks
}

// ── Display helpers ──

impl DryRunPlan {
    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Dry run: {} ({} requests planned)",
            self.endpoint, self.total_requests,
        ));
        lines.push(String::new());

        for case in &self.cases {
            lines.push(format!(
                "  GET {} -> {} [{}]",
                case.request, case.expected_status, case.kind
            ));
            lines.push(format!("      {}", case.name));
        }
        lines.push(String::new());

        lines.push("Config validation:".into());
        for v in &self.validations {
            lines.push(format!("  [{}] {}", v.status, v.message));
        }

        lines.join("\n")
    }

    /// Returns true if any validation has Error status.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Error)
    }

    /// Returns true if any validation has Warning status.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Warning)
    }
}
