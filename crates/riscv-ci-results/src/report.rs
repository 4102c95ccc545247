//! Plain-text rendering of a processed run.
//!
//! Output is a pure function of the records, so two runs over the same
//! logs produce byte-identical reports. Rows are right-trimmed.

use crate::aggregate::{OutcomeCounts, Summary, Verdict};
use crate::result::{LogRecord, ResultKind};
use crate::ProcessedRun;

/// Placeholder printed for an outcome section without members.
pub const EMPTY_SECTION: &str = "(none)";

/// Label of the grand-total row.
pub const TOTAL_LABEL: &str = "All targets:";

const SEPARATOR: &str = "-----";

/// Lines of a headline box, including the blank lines around it.
pub fn box_lines(title: &str) -> Vec<String> {
    let edge = format!(" +=={}==+", "=".repeat(title.chars().count()));
    vec![
        String::new(),
        edge.clone(),
        format!(" |  {}  |", title),
        edge,
        String::new(),
    ]
}

fn push_box(out: &mut String, title: &str) {
    for line in box_lines(title) {
        out.push_str(&line);
        out.push('\n');
    }
}

fn push_row(out: &mut String, cells: [&str; 6]) {
    let row = format!(
        "{:<25} {:<10} {:<10} {:<10} {:<10} {:<10}",
        cells[0], cells[1], cells[2], cells[3], cells[4], cells[5]
    );
    out.push_str(row.trim_end());
    out.push('\n');
}

fn push_counts(out: &mut String, label: &str, c: &OutcomeCounts) {
    let [pass, not_applicable, fail, exception] = ResultKind::ALL.map(|kind| c.get(kind).to_string());
    push_row(
        out,
        [label, &c.total.to_string(), &pass, &not_applicable, &fail, &exception],
    );
}

/// One boxed section per outcome listing test names in input order.
pub fn render_grouped_listing(records: &[LogRecord]) -> String {
    let mut out = String::new();
    for kind in ResultKind::ALL {
        push_box(&mut out, kind.caption());
        let mut any = false;
        for record in records.iter().filter(|r| r.result == kind) {
            out.push_str(&record.test_name());
            out.push('\n');
            any = true;
        }
        if !any {
            out.push_str(EMPTY_SECTION);
            out.push('\n');
        }
    }
    out
}

/// Per-target table followed by the grand-total row.
pub fn render_summary_table(summary: &Summary) -> String {
    let mut out = String::new();
    push_box(&mut out, "Summary");

    let sep = [SEPARATOR; 6];
    push_row(&mut out, ["Target", "# tests", "Pass", "Not_appl.", "Fail", "Exception"]);
    push_row(&mut out, sep);
    for (target, counts) in &summary.targets {
        push_counts(&mut out, target, counts);
    }
    push_row(&mut out, sep);
    push_counts(&mut out, TOTAL_LABEL, &summary.totals);
    push_row(&mut out, sep);
    out
}

fn render_verdict(verdict: Verdict, totals: &OutcomeCounts) -> String {
    match verdict {
        Verdict::Success => format!("\nVerdict: success ({} tests)\n", totals.total),
        Verdict::Failure => format!(
            "\nVerdict: failure ({} failed, {} ended with exception)\n",
            totals.fail, totals.exception
        ),
    }
}

/// Full report: grouped listing, summary table and verdict line.
pub fn render_report(run: &ProcessedRun) -> String {
    let mut out = render_grouped_listing(&run.records);
    out.push_str(&render_summary_table(&run.summary));
    out.push_str(&render_verdict(run.verdict, &run.summary.totals));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rec(name: &str, target: &str, kind: ResultKind) -> LogRecord {
        LogRecord::new(format!("/logs/{}.log", name), target, kind)
    }

    #[test]
    fn test_box_lines() {
        assert_eq!(
            box_lines("Summary"),
            vec!["", " +===========+", " |  Summary  |", " +===========+", ""]
        );
    }

    #[test]
    fn test_grouped_listing_with_placeholders() {
        let records = vec![
            rec("b", "X", ResultKind::Pass),
            rec("a", "X", ResultKind::Pass),
            rec("c", "X", ResultKind::Fail),
        ];
        let listing = render_grouped_listing(&records);
        let expected = "\n +================+\n |  Passed tests  |\n +================+\n\nb\na\n\
\n +========================+\n |  Not applicable tests  |\n +========================+\n\n(none)\n\
\n +================+\n |  Failed tests  |\n +================+\n\nc\n\
\n +==============================+\n |  Tests ended with exception  |\n +==============================+\n\n(none)\n";
        assert_eq!(listing, expected);
    }

    #[test]
    fn test_summary_table_layout() {
        let records = vec![
            rec("a", "X", ResultKind::Pass),
            rec("b", "X", ResultKind::Fail),
            rec("c", "Y", ResultKind::NotApplicable),
            rec("d", "Y", ResultKind::Exception),
        ];
        let summary = Summary::from_records(&records).unwrap();
        let table = render_summary_table(&summary);
        let lines: Vec<&str> = table.lines().skip(5).collect();

        assert_eq!(
            lines,
            vec![
                "Target                    # tests    Pass       Not_appl.  Fail       Exception",
                "-----                     -----      -----      -----      -----      -----",
                "X                         2          1          0          1          0",
                "Y                         2          0          1          0          1",
                "-----                     -----      -----      -----      -----      -----",
                "All targets:              4          1          1          1          1",
                "-----                     -----      -----      -----      -----      -----",
            ]
        );
    }

    #[test]
    fn test_long_target_is_not_truncated() {
        let name = "a_really_long_target_name_over_25";
        let summary = Summary::from_records(&[rec("a", name, ResultKind::Pass)]).unwrap();
        let table = render_summary_table(&summary);
        assert!(table.contains(&format!("{} 1          1", name)));
    }

    #[test]
    fn test_verdict_lines() {
        let totals = OutcomeCounts {
            total: 3,
            pass: 1,
            not_applicable: 0,
            fail: 1,
            exception: 1,
        };
        assert_eq!(
            render_verdict(Verdict::Failure, &totals),
            "\nVerdict: failure (1 failed, 1 ended with exception)\n"
        );
        assert_eq!(
            render_verdict(Verdict::Success, &totals),
            "\nVerdict: success (3 tests)\n"
        );
    }
}
