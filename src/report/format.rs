//! Terminal rendering of an `AuditReport`.
//!
//! Formatting lives here so the audit computation stays free of layout code.

use crate::domain::Cap;
use crate::report::{AuditReport, VintageAudit};

/// Format the full audit summary (moments, balance tables, KS test).
pub fn format_audit(report: &AuditReport) -> String {
    let mut out = String::new();

    out.push_str("=== Sample weight audit ===\n");
    out.push_str(&format!(
        "Rows: n={} | effective n={:.1} ({:.1}%)\n",
        report.n_rows,
        report.effective_sample_size,
        100.0 * ratio(report.effective_sample_size, report.n_rows as f64),
    ));
    if let Some(ids) = report.distinct_ids {
        out.push_str(&format!("Distinct ids: {ids}\n"));
    }
    out.push_str(&format!("Cap: {}\n", fmt_cap(report.cap)));

    let m = &report.moments;
    out.push_str("\nWeights:\n");
    out.push_str(&format!(
        "mean={:.4} std={:.4} min={:.4} median={:.4} p99={:.4} max={:.4} zeros={}\n",
        m.mean, m.std, m.min, m.median, m.p99, m.max, m.zeros
    ));

    out.push_str("\nEvent rate:\n");
    out.push_str(&format!(
        "raw={:.4} weighted={:.4}\n",
        report.raw_event_rate, report.weighted_event_rate
    ));
    for class in &report.classes {
        out.push_str(&format!(
            "- target={} rows={} weight_sum={:.3}\n",
            class.target, class.rows, class.weight_sum
        ));
    }

    out.push_str("\nPer vintage:\n");
    out.push_str(&format_vintages(&report.vintages));

    out.push_str("\nKS vs uniform weights:\n");
    match report.ks {
        Some(ks) => out.push_str(&format!("D={:.4} p={:.4}\n", ks.statistic, ks.p_value)),
        None => out.push_str("n/a (empty table)\n"),
    }

    out
}

fn format_vintages(rows: &[VintageAudit]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<8} {:>8} {:>8} {:>12} {:>10} {:>10}\n",
            "vintage", "rows", "bads", "weight_sum", "raw_er", "w_er"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<8} {:-<8} {:-<8} {:-<12} {:-<10} {:-<10}\n", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:<8} {:>8} {:>8} {:>12.3} {:>10.4} {:>10.4}\n",
                r.vintage.to_string(),
                r.rows,
                r.bads,
                r.weight_sum,
                r.raw_event_rate,
                r.weighted_event_rate,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn fmt_cap(cap: Option<Cap>) -> String {
    match cap {
        None => "none".to_string(),
        Some(Cap::Absolute(c)) => format!("{c}"),
        Some(Cap::Quantile { quantile }) => format!("q{quantile}"),
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}
