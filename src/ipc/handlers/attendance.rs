use crate::error::AttendanceError;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{
    check_len, get_optional_date, get_optional_str, get_optional_u32, get_required_date,
    get_required_str, get_required_u32, open_workspace, parse_date, parse_status,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{Actor, Attendance, AttendanceInput, DayStatistics};
use crate::service::AttendanceService;
use crate::stats::StatusCounts;
use crate::store::{self, AttendanceFilter};
use rusqlite::Connection;
use serde_json::json;
use std::collections::BTreeSet;

const MAX_NOTE: usize = 500;
const MAX_CLASS: usize = 50;
pub const MIN_REPORT_YEAR: u32 = 2000;
pub const MAX_REPORT_YEAR: u32 = 2100;

fn attendance_json(a: &Attendance) -> serde_json::Value {
    json!({
        "id": a.id,
        "studentId": a.student_id,
        "date": a.date.to_string(),
        "status": a.status.as_str(),
        "note": a.note,
        "recordedBy": a.recorded_by,
        "createdAt": a.created_at,
        "updatedAt": a.updated_at
    })
}

fn stats_json(s: &DayStatistics) -> serde_json::Value {
    json!({
        "date": s.date.to_string(),
        "total": s.total,
        "present": s.present,
        "absent": s.absent,
        "late": s.late,
        "percentage": s.percentage
    })
}

fn parse_actor(params: &serde_json::Value) -> Result<Actor, HandlerErr> {
    let Some(raw) = params.get("actor") else {
        return Err(HandlerErr::bad_params("missing actor"));
    };
    let actor: Actor = serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::bad_params(format!("actor: {}", e)))?;
    if actor.id.trim().is_empty() {
        return Err(HandlerErr::bad_params("actor.id must not be empty"));
    }
    Ok(actor)
}

/// Parses `attendances`; each entry uses its own `date` or the batch `date`.
fn parse_batch(params: &serde_json::Value) -> Result<Vec<AttendanceInput>, HandlerErr> {
    let batch_date = get_optional_date(params, "date")?;
    let Some(entries) = params.get("attendances").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params("missing attendances"));
    };
    if entries.is_empty() {
        return Err(HandlerErr::bad_params("attendances must contain at least one entry"));
    }

    let mut out = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let at = |field: &str| format!("attendances.{}.{}", i, field);
        let student_id = get_required_str(entry, "studentId")
            .map_err(|_| HandlerErr::bad_params(format!("missing {}", at("studentId"))))?;
        let status_raw = get_required_str(entry, "status")
            .map_err(|_| HandlerErr::bad_params(format!("missing {}", at("status"))))?;
        let status = parse_status(&at("status"), &status_raw)?;
        let date = match get_optional_str(entry, "date")? {
            Some(raw) if !raw.is_empty() => parse_date(&at("date"), &raw)?,
            _ => batch_date.ok_or_else(|| HandlerErr::bad_params(format!("missing {}", at("date"))))?,
        };
        let note = get_optional_str(entry, "note")?.filter(|s| !s.is_empty());
        if let Some(n) = &note {
            check_len(&at("note"), n, MAX_NOTE)?;
        }
        out.push(AttendanceInput {
            student_id,
            date,
            status,
            note,
        });
    }
    Ok(out)
}

fn attendance_record_bulk(
    conn: &Connection,
    service: &AttendanceService,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let actor = parse_actor(params)?;
    let batch = parse_batch(params)?;

    let ids: Vec<String> = batch.iter().map(|r| r.student_id.clone()).collect();
    let missing = store::missing_student_ids(conn, &ids)?;
    if !missing.is_empty() {
        return Err(HandlerErr {
            code: "bad_params",
            message: "unknown student id(s)".to_string(),
            details: Some(json!({ "unknownStudentIds": missing })),
        });
    }

    let recorded = service
        .record_bulk_attendance(conn, &batch, &actor)
        .map_err(|e| HandlerErr {
            code: match e.code() {
                "db_query_failed" => "db_tx_failed",
                other => other,
            },
            message: format!("failed to record attendance: {}", e),
            details: None,
        })?;

    let counts = StatusCounts::tally(recorded.iter().map(|r| r.status));
    let dates: BTreeSet<String> = recorded.iter().map(|r| r.date.to_string()).collect();
    Ok(json!({
        "message": format!("Attendance recorded for {} student(s)", recorded.len()),
        "recordedCount": recorded.len(),
        "dates": dates,
        "statistics": {
            "present": counts.present,
            "absent": counts.absent,
            "late": counts.late,
            "percentage": counts.percentage()
        },
        "records": recorded.iter().map(attendance_json).collect::<Vec<_>>()
    }))
}

fn attendance_today(
    conn: &Connection,
    service: &AttendanceService,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    Ok(stats_json(&service.today_statistics(conn)?))
}

fn attendance_statistics(
    conn: &Connection,
    service: &AttendanceService,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = get_required_date(params, "date")?;
    Ok(stats_json(&service.statistics_for_date(conn, date)?))
}

/// Validated `(month, year, class)` of a monthly report request.
pub fn parse_report_params(params: &serde_json::Value) -> Result<(u32, i32, String), HandlerErr> {
    let month = get_required_u32(params, "month")?;
    if !(1..=12).contains(&month) {
        return Err(HandlerErr::bad_params("month must be between 1 and 12"));
    }
    let year = get_required_u32(params, "year")?;
    if !(MIN_REPORT_YEAR..=MAX_REPORT_YEAR).contains(&year) {
        return Err(HandlerErr::bad_params(format!(
            "year must be between {} and {}",
            MIN_REPORT_YEAR, MAX_REPORT_YEAR
        )));
    }
    let class = get_required_str(params, "class")?;
    check_len("class", &class, MAX_CLASS)?;
    Ok((month, year as i32, class))
}

fn attendance_monthly_report(
    conn: &Connection,
    service: &AttendanceService,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let (month, year, class) = parse_report_params(params)?;
    let report = service.generate_monthly_report(conn, month, year, &class)?;
    serde_json::to_value(&report).map_err(|e| HandlerErr {
        code: "internal",
        message: e.to_string(),
        details: None,
    })
}

fn attendance_list(
    conn: &Connection,
    _service: &AttendanceService,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let status = match get_optional_str(params, "status")? {
        Some(s) if !s.is_empty() => Some(parse_status("status", &s)?),
        _ => None,
    };
    let filter = AttendanceFilter {
        date: get_optional_date(params, "date")?,
        class: get_optional_str(params, "class")?,
        section: get_optional_str(params, "section")?,
        status,
        page: get_optional_u32(params, "page")?.unwrap_or(1),
        per_page: get_optional_u32(params, "perPage")?.unwrap_or(store::DEFAULT_PER_PAGE),
    };
    let (rows, meta) = store::list_attendance(conn, &filter)?;
    let rows_json: Vec<serde_json::Value> = rows
        .iter()
        .map(|r| {
            let mut v = attendance_json(&r.attendance);
            v["student"] = json!({
                "id": r.attendance.student_id,
                "name": r.student_name,
                "studentId": r.student_number,
                "class": r.class,
                "section": r.section
            });
            v
        })
        .collect();
    Ok(json!({
        "attendances": rows_json,
        "meta": {
            "currentPage": meta.current_page,
            "lastPage": meta.last_page,
            "perPage": meta.per_page,
            "total": meta.total
        }
    }))
}

fn attendance_student_report(
    conn: &Connection,
    _service: &AttendanceService,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let start = get_optional_date(params, "startDate")?;
    let end = get_optional_date(params, "endDate")?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(HandlerErr::bad_params("startDate must not be after endDate"));
        }
    }
    let Some(student) = store::get_student(conn, &student_id)? else {
        return Err(AttendanceError::NotFound("student").into());
    };
    let rows = store::attendance_for_student(conn, &student.id, start, end)?;
    let counts = StatusCounts::tally(rows.iter().map(|r| r.status));
    Ok(json!({
        "student": super::students::student_json(&student),
        "startDate": start.map(|d| d.to_string()),
        "endDate": end.map(|d| d.to_string()),
        "records": rows.iter().map(attendance_json).collect::<Vec<_>>(),
        "statistics": {
            "total": counts.total(),
            "present": counts.present,
            "absent": counts.absent,
            "late": counts.late,
            "percentage": counts.percentage()
        }
    }))
}

type Handler =
    fn(&Connection, &AttendanceService, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>;

fn run(state: &mut AppState, req: &Request, f: Handler) -> serde_json::Value {
    let result = open_workspace(state).and_then(|(conn, service)| f(conn, service, &req.params));
    match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.recordBulk" => Some(run(state, req, attendance_record_bulk)),
        "attendance.today" => Some(run(state, req, attendance_today)),
        "attendance.statistics" => Some(run(state, req, attendance_statistics)),
        "attendance.monthlyReport" => Some(run(state, req, attendance_monthly_report)),
        "attendance.list" => Some(run(state, req, attendance_list)),
        "attendance.studentReport" => Some(run(state, req, attendance_student_report)),
        _ => None,
    }
}
