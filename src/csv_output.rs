//! CSV output format for bad-run reports
//!
//! One row per flagged `(profile, run)` pair, for spreadsheet analysis.

use crate::batch::BatchReport;
use crate::detector::FlagReason;

/// CSV output formatter
#[derive(Debug)]
pub struct CsvOutput<'a> {
    report: &'a BatchReport,
}

impl<'a> CsvOutput<'a> {
    pub fn new(report: &'a BatchReport) -> Self {
        Self { report }
    }

    fn header() -> &'static str {
        "profile,run,content,error,mean,sigma,mean_error,sigma_error,reason"
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut lines = vec![Self::header().to_string()];
        for check in &self.report.checks {
            let stats = &check.statistics;
            for flag in &check.flagged {
                let reason = match flag.reason {
                    FlagReason::Content => "content",
                    FlagReason::Error => "error",
                    FlagReason::Both => "both",
                };
                lines.push(format!(
                    "{},{},{},{},{},{},{},{},{}",
                    Self::escape_field(&check.profile),
                    flag.run,
                    flag.content,
                    flag.error,
                    stats.mean_content,
                    stats.sigma_content,
                    stats.mean_error,
                    stats.sigma_error,
                    reason
                ));
            }
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}
