use crate::model::MonthlyReport;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

const RULE_WIDTH: usize = 100;

/// Class label reduced to `[A-Za-z0-9-]`, everything else replaced by `_`.
pub fn sanitize_class(class: &str) -> String {
    class
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Labels changed by sanitizing carry a digest of the raw label, so "10/A"
/// and "10 A" never share a file.
pub fn report_file_name(class: &str, month: u32, year: i32) -> String {
    let sanitized = sanitize_class(class);
    if sanitized == class {
        return format!("attendance-{}-{}-{}.txt", sanitized, month, year);
    }
    let mut hasher = Sha256::new();
    hasher.update(class.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!(
        "attendance-{}-{}-{}-{}.txt",
        sanitized,
        &digest[..8],
        month,
        year
    )
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Fixed-width plain-text rendering of a monthly report.
pub fn render_text(report: &MonthlyReport, generated_at: &str) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "ATTENDANCE REPORT");
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(out, "Class: {}", report.class);
    let _ = writeln!(out, "Month: {}/{}", report.month, report.year);
    let _ = writeln!(out, "Generated: {}", generated_at);
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<15} {:<30} {:<12} {:<10} {:<10} {:<10} {:<12}",
        "Student ID", "Name", "Total Days", "Present", "Absent", "Late", "Percentage"
    );
    let _ = writeln!(out, "{}", light);
    for s in &report.students {
        let _ = writeln!(
            out,
            "{:<15} {:<30} {:<12} {:<10} {:<10} {:<10} {:<12}",
            s.student_id,
            truncate_chars(&s.name, 30),
            s.total_days,
            s.present,
            s.absent,
            s.late,
            format!("{}%", s.percentage)
        );
    }

    let summary = &report.summary;
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(out, "SUMMARY STATISTICS");
    let _ = writeln!(out, "{}", light);
    let _ = writeln!(out, "Total Students: {}", summary.total_students);
    let _ = writeln!(out, "Average Attendance: {}%", summary.average_percentage);
    let _ = writeln!(out, "Total Present: {}", summary.total_present);
    let _ = writeln!(out, "Total Absent: {}", summary.total_absent);
    let _ = writeln!(out, "Total Late: {}", summary.total_late);
    out
}

/// Writes the rendered report under `<workspace>/reports/` and returns its path.
pub fn export_text(
    workspace: &Path,
    report: &MonthlyReport,
    generated_at: &str,
) -> std::io::Result<PathBuf> {
    let dir = workspace.join("reports");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(report_file_name(&report.class, report.month, report.year));
    std::fs::write(&path, render_text(report, generated_at))?;
    Ok(path)
}
