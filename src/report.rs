use std::fmt::Write;

use crate::batch::{BatchSummary, SessionOutcome};
use crate::models::DateRange;

pub fn build_report(range: &DateRange, summary: &BatchSummary) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Tutor Eval Batch Report");
    let _ = writeln!(
        output,
        "Sessions from {} through {}",
        range.start(),
        range.end()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Outcome Mix");

    if summary.is_empty() {
        let _ = writeln!(output, "No sessions recorded for this range.");
        return output;
    }

    let _ = writeln!(output, "- filled: {}", summary.submitted());
    let _ = writeln!(output, "- skipped (malformed record): {}", summary.skipped());
    let _ = writeln!(output, "- abandoned mid-form: {}", summary.abandoned());

    let _ = writeln!(output);
    let _ = writeln!(output, "## Filled Sessions");
    let filled: Vec<_> = summary
        .results
        .iter()
        .filter(|result| matches!(result.outcome, SessionOutcome::Submitted))
        .collect();
    if filled.is_empty() {
        let _ = writeln!(output, "None.");
    } else {
        for result in filled {
            let _ = writeln!(output, "- {}", result.label);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Needs Attention");
    let mut flagged = 0usize;
    for result in &summary.results {
        match &result.outcome {
            SessionOutcome::Submitted => continue,
            SessionOutcome::Skipped(reason) => {
                let _ = writeln!(output, "- {}: skipped, {}", result.label, reason);
            }
            SessionOutcome::Abandoned { state, reason } => {
                let _ = writeln!(
                    output,
                    "- {}: stopped at {:?}, {} (form may be partially filled)",
                    result.label, state, reason
                );
            }
        }
        flagged += 1;
    }
    if flagged == 0 {
        let _ = writeln!(output, "None.");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::SessionResult;
    use crate::driver::DriverState;
    use crate::error::MalformedRecord;
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange::single(NaiveDate::from_ymd_opt(2022, 11, 27).unwrap())
    }

    #[test]
    fn empty_summary_reports_no_sessions() {
        let report = build_report(&range(), &BatchSummary::default());
        assert!(report.contains("Sessions from 2022-11-27 through 2022-11-27"));
        assert!(report.contains("No sessions recorded for this range."));
    }

    #[test]
    fn lists_filled_and_flagged_sessions() {
        let summary = BatchSummary {
            results: vec![
                SessionResult {
                    label: "row 500 (Ada Lovelace on 11/27/2022)".to_string(),
                    outcome: SessionOutcome::Submitted,
                },
                SessionResult {
                    label: "row 501 (Grace Hopper on 11/27/2022)".to_string(),
                    outcome: SessionOutcome::Skipped(MalformedRecord::Missing { field: "time in" }),
                },
                SessionResult {
                    label: "row 502 (Alan Turing on 11/27/2022)".to_string(),
                    outcome: SessionOutcome::Abandoned {
                        state: DriverState::TopicsSection,
                        reason: "timed out after 10s".to_string(),
                    },
                },
            ],
        };

        let report = build_report(&range(), &summary);
        assert!(report.contains("- filled: 1"));
        assert!(report.contains("- skipped (malformed record): 1"));
        assert!(report.contains("- abandoned mid-form: 1"));
        assert!(report.contains("- row 500 (Ada Lovelace on 11/27/2022)\n"));
        assert!(report.contains("row 501 (Grace Hopper on 11/27/2022): skipped, missing time in"));
        assert!(report.contains("stopped at TopicsSection, timed out after 10s"));
    }
}
