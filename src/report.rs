use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{InactiveThesis, StatusCount};

pub fn build_report(
    now: DateTime<Utc>,
    distribution: &[StatusCount],
    inactive: &[InactiveThesis],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Thesis Status Report");
    let _ = writeln!(output, "Generated {}", now.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(output);

    let _ = writeln!(output, "## Status Distribution");
    if distribution.is_empty() {
        let _ = writeln!(output, "No theses recorded.");
    } else {
        for count in distribution {
            let _ = writeln!(
                output,
                "- {}: {} theses",
                count.status_name, count.thesis_count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## No Completed Guidance in 90 Days");
    if inactive.is_empty() {
        let _ = writeln!(output, "Every thesis has recent completed guidance.");
    } else {
        for thesis in inactive {
            let started = thesis
                .start_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "unknown start".to_string());
            let _ = writeln!(
                output,
                "- {} ({}, started {})",
                thesis.title,
                thesis.status_name.as_deref().unwrap_or("unassigned"),
                started
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn report_lists_distribution_and_inactive_theses() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let distribution = vec![
            StatusCount {
                status_name: "Ongoing".to_string(),
                thesis_count: 4,
            },
            StatusCount {
                status_name: "at_risk".to_string(),
                thesis_count: 1,
            },
        ];
        let inactive = vec![InactiveThesis {
            title: "Knowledge Graph for Curriculum Mapping".to_string(),
            status_name: Some("at_risk".to_string()),
            start_date: Some(now - chrono::Duration::days(120)),
        }];

        let report = build_report(now, &distribution, &inactive);
        assert!(report.contains("- Ongoing: 4 theses"));
        assert!(report.contains("- at_risk: 1 theses"));
        assert!(report.contains("Knowledge Graph for Curriculum Mapping"));
        assert!(report.contains("started 2025-11-01"));
    }

    #[test]
    fn report_handles_empty_tables() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let report = build_report(now, &[], &[]);
        assert!(report.contains("No theses recorded."));
        assert!(report.contains("Every thesis has recent completed guidance."));
    }
}
