use chrono::Local;
use serde_json::json;
use tracing::info;

use crate::error::AttendanceError;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::handlers::attendance::parse_report_params;
use crate::ipc::helpers::open_workspace;
use crate::ipc::types::{AppState, Request};
use crate::model::MonthlyReport;
use crate::report;

fn generated_at() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn build_report(state: &AppState, params: &serde_json::Value) -> Result<MonthlyReport, HandlerErr> {
    let (conn, service) = open_workspace(state)?;
    let (month, year, class) = parse_report_params(params)?;
    Ok(service.generate_monthly_report(conn, month, year, &class)?)
}

fn reports_monthly_text(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let report = build_report(state, params)?;
    Ok(json!({
        "fileName": report::report_file_name(&report.class, report.month, report.year),
        "text": report::render_text(&report, &generated_at())
    }))
}

fn reports_export_monthly(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let report = build_report(state, params)?;
    let Some(workspace) = state.workspace.as_ref() else {
        return Err(HandlerErr {
            code: "no_workspace",
            message: "select a workspace first".to_string(),
            details: None,
        });
    };
    let path = report::export_text(workspace, &report, &generated_at())
        .map_err(AttendanceError::from)?;
    info!(path = %path.to_string_lossy(), class = %report.class, "monthly report exported");
    Ok(json!({
        "path": path.to_string_lossy(),
        "students": report.students.len(),
        "averageAttendance": report.summary.average_percentage
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "reports.monthlyText" => reports_monthly_text(state, &req.params),
        "reports.exportMonthly" => reports_export_monthly(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    })
}
