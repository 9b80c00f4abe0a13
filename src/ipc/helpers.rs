use chrono::NaiveDate;
use rusqlite::Connection;

use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use crate::model::AttendanceStatus;
use crate::service::AttendanceService;

pub fn open_workspace(state: &AppState) -> Result<(&Connection, &AttendanceService), HandlerErr> {
    match (state.db.as_ref(), state.service.as_ref()) {
        (Some(conn), Some(service)) => Ok((conn, service)),
        _ => Err(HandlerErr {
            code: "no_workspace",
            message: "select a workspace first".to_string(),
            details: None,
        }),
    }
}

pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.trim().to_string()))
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a string", key))),
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    match get_optional_str(params, key)? {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(HandlerErr::bad_params(format!("missing {}", key))),
    }
}

/// Rejects values longer than `max` characters.
pub fn check_len(key: &str, value: &str, max: usize) -> Result<(), HandlerErr> {
    if value.chars().count() > max {
        return Err(HandlerErr::bad_params(format!(
            "{} must be at most {} characters",
            key, max
        )));
    }
    Ok(())
}

pub fn parse_date(key: &str, raw: &str) -> Result<NaiveDate, HandlerErr> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| HandlerErr::bad_params(format!("{} must be a YYYY-MM-DD date", key)))
}

pub fn get_optional_date(params: &serde_json::Value, key: &str) -> Result<Option<NaiveDate>, HandlerErr> {
    match get_optional_str(params, key)? {
        Some(s) if !s.is_empty() => parse_date(key, &s).map(Some),
        _ => Ok(None),
    }
}

pub fn get_required_date(params: &serde_json::Value, key: &str) -> Result<NaiveDate, HandlerErr> {
    let raw = get_required_str(params, key)?;
    parse_date(key, &raw)
}

pub fn get_optional_u32(params: &serde_json::Value, key: &str) -> Result<Option<u32>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .or_else(|| v.as_str().and_then(|s| s.trim().parse::<u32>().ok()))
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a non-negative integer", key))),
    }
}

pub fn get_required_u32(params: &serde_json::Value, key: &str) -> Result<u32, HandlerErr> {
    get_optional_u32(params, key)?.ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn parse_status(key: &str, raw: &str) -> Result<AttendanceStatus, HandlerErr> {
    raw.parse::<AttendanceStatus>()
        .map_err(|e| HandlerErr::bad_params(format!("{}: {}", key, e)))
}
