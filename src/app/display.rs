//! Scan result rendering for the terminal

use crate::scanner::types::{ResultStatus, ScanResult, Severity};
use colored::Colorize;
use prettytable::{format, Cell, Row, Table};

/// Render a scan result as a findings table plus a summary block
pub fn render_result(result: &ScanResult) -> String {
    let mut out = String::new();

    let status = match result.status {
        ResultStatus::Completed => "completed".green().to_string(),
        ResultStatus::Failed => "failed".red().to_string(),
        ResultStatus::Error => "error".red().bold().to_string(),
    };
    out.push_str(&format!(
        "{} ({}) - {} in {:.2}s\n\n",
        result.repo_name, result.repo_url, status, result.scan_duration
    ));

    if result.secrets.is_empty() {
        out.push_str("No secrets detected.\n");
    } else {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(Row::new(vec![
            Cell::new("SEVERITY"),
            Cell::new("TYPE"),
            Cell::new("LOCATION"),
            Cell::new("CONTEXT"),
        ]));
        for finding in &result.secrets {
            let severity = match finding.severity {
                Severity::High => "HIGH".red().bold().to_string(),
                Severity::Medium => "MEDIUM".yellow().to_string(),
            };
            table.add_row(Row::new(vec![
                Cell::new(&severity),
                Cell::new(&finding.secret_type),
                Cell::new(&format!("{}:{}", finding.file_path, finding.line_number)),
                Cell::new(&truncate(&finding.context, 60)),
            ]));
        }
        out.push_str(&table.to_string());
        out.push_str(&format!("\n{} secret(s) found\n", result.secrets.len()));
    }

    out.push_str(&format!(
        "\nRepository: {} files, {} directories, {:.1} KB\n",
        result.summary.file_count, result.summary.directory_count, result.summary.total_size_kb
    ));
    if !result.summary.by_language.is_empty() {
        let langs: Vec<String> = result
            .summary
            .by_language
            .iter()
            .map(|(lang, count)| format!("{} ({})", lang, count))
            .collect();
        out.push_str(&format!("Languages: {}\n", langs.join(", ")));
    }
    if !result.summary.sensitive_files.is_empty() {
        out.push_str(&format!(
            "Sensitive files: {}\n",
            result.summary.sensitive_files.join(", ")
        ));
    }
    if !result.errors.is_empty() {
        out.push_str("\nNon-fatal issues:\n");
        for error in &result.errors {
            out.push_str(&format!("  - {}\n", error));
        }
    }

    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::types::Finding;

    fn sample_result() -> ScanResult {
        let mut result = ScanResult::failed("widget_1a2b3c4d", "https://x/widget.git", "e".into(), 1.0);
        result.status = ResultStatus::Completed;
        result.errors.clear();
        result.secrets.push(Finding {
            file_path: "config.yaml".to_string(),
            line_number: 3,
            secret_type: "Generic API Key".to_string(),
            severity: Severity::High,
            context: "api_key: \"ABCD************QRST\"".to_string(),
            start: 10,
            end: 30,
            matched_value: "ABCD************QRST".to_string(),
            provider: "pattern".to_string(),
        });
        result
    }

    #[test]
    fn test_render_contains_finding_and_counts() {
        colored::control::set_override(false);
        let rendered = render_result(&sample_result());
        assert!(rendered.contains("Generic API Key"));
        assert!(rendered.contains("config.yaml:3"));
        assert!(rendered.contains("1 secret(s) found"));
        colored::control::unset_override();
    }

    #[test]
    fn test_render_empty_result() {
        colored::control::set_override(false);
        let mut result = sample_result();
        result.secrets.clear();
        let rendered = render_result(&result);
        assert!(rendered.contains("No secrets detected"));
        colored::control::unset_override();
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        let long = "x".repeat(100);
        let cut = truncate(&long, 60);
        assert_eq!(cut.chars().count(), 63);
        assert!(cut.ends_with("..."));
    }
}
