//! HTTP file generator - converts failed cases to .http format

use crate::verdict::{CaseOutcome, SuiteReport};

/// Generate .http file content from the failed cases of a report
pub fn to_http_file(report: &SuiteReport, base_url_var: &str) -> String {
    let failed: Vec<&CaseOutcome> = report.failed_cases().collect();
    let mut lines = Vec::new();

    lines.push(format!(
        "# Auto-generated reproduction cases ({} failed of {})",
        failed.len(),
        report.total()
    ));
    lines.push(format!("# Base URL variable: {{{{{base_url_var}}}}}"));
    lines.push(String::new());

    for (idx, case) in failed.iter().enumerate() {
        let status = case
            .response
            .as_ref()
            .map_or_else(|| "no response".to_string(), |r| r.status_code.to_string());
        lines.push(format!("### [{idx}] {} -> {status}", case.name));
        for f in &case.failures {
            lines.push(format!("# {f}"));
        }

        let url = if case.request.url.starts_with("http") {
            case.request.url.clone()
        } else {
            format!("{{{{{base_url_var}}}}}{}", case.request.url)
        };
        lines.push(format!("{} {url}", case.request.method));
        lines.push("Accept: application/json".to_string());

        lines.push(String::new());
        lines.push("###".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}
