use std::path::Path;

use emmascraper_lib::CrawlReport;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn row(metric: impl Into<String>, value: impl ToString) -> SummaryRow {
    SummaryRow {
        metric: metric.into(),
        value: value.to_string(),
    }
}

fn written(rows: usize) -> String {
    if rows == 0 {
        "skipped (empty)".to_string()
    } else {
        rows.to_string()
    }
}

fn build_summary_rows(report: &CrawlReport, issuers_out: &Path, pricing_out: &Path) -> Vec<SummaryRow> {
    vec![
        row("CUSIPs", report.identifiers),
        row("CUSIPs without issues", report.skipped),
        row("Issues", report.issues),
        row("Pricing rows", report.pricing_rows),
        row("Label columns", report.label_columns),
        row(
            format!("Rows written to {}", issuers_out.display()),
            written(report.issuer_rows_written),
        ),
        row(
            format!("Rows written to {}", pricing_out.display()),
            written(report.pricing_rows_written),
        ),
    ]
}

pub fn print_summary(report: &CrawlReport, issuers_out: &Path, pricing_out: &Path) {
    let mut table = Table::new(build_summary_rows(report, issuers_out, pricing_out));
    table.with(Style::sharp());
    println!("{}", table);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_rows_follow_report() {
        let report = CrawlReport {
            identifiers: 2,
            skipped: 1,
            issues: 2,
            pricing_rows: 5,
            label_columns: 4,
            issuer_rows_written: 2,
            pricing_rows_written: 0,
        };
        let rows = build_summary_rows(&report, Path::new("db1.csv"), Path::new("db2.csv"));

        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].metric, "CUSIPs");
        assert_eq!(rows[0].value, "2");
        assert_eq!(rows[3].value, "5");
        assert_eq!(rows[5].metric, "Rows written to db1.csv");
        assert_eq!(rows[5].value, "2");
        assert_eq!(rows[6].value, "skipped (empty)");
    }

    #[test]
    fn summary_table_has_headers() {
        let rows = build_summary_rows(&CrawlReport::default(), Path::new("a.csv"), Path::new("b.csv"));
        let rendered = Table::new(rows).to_string();
        assert!(rendered.contains("Metric"));
        assert!(rendered.contains("Value"));
        assert!(rendered.contains("Rows written to a.csv"));
    }
}
