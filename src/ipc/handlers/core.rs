use crate::cache::{stats_namespace_pattern, MemoryCache};
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::open_workspace;
use crate::ipc::types::{AppState, Request};
use crate::service::AttendanceService;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub const AUDIT_LOG_FILE: &str = "audit.log";

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

/// Opens (creating if needed) the workspace database and wires a new
/// attendance service with an empty statistics cache.
pub fn select_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<()> {
    let conn = db::open_db(path)?;
    let service = AttendanceService::with_default_subscribers(
        Arc::new(MemoryCache::new()),
        state.config.invalidation,
        state.config.stats_ttl,
        Some(path.join(AUDIT_LOG_FILE)),
    );
    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    state.service = Some(service);
    info!(workspace = %path.to_string_lossy(), "workspace opened");
    Ok(())
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match select_workspace(state, &path) {
        Ok(()) => ok(&req.id, json!({ "workspacePath": path.to_string_lossy() })),
        Err(e) => {
            warn!(path = %path.to_string_lossy(), error = %e, "workspace open failed");
            err(&req.id, "db_open_failed", format!("{e:?}"), None)
        }
    }
}

fn handle_cache_keys(state: &mut AppState, req: &Request) -> serde_json::Value {
    let service = match open_workspace(state) {
        Ok((_, service)) => service,
        Err(e) => return e.response(&req.id),
    };
    match service.cache().list_keys(&stats_namespace_pattern()) {
        Ok(keys) => ok(&req.id, json!({ "keys": keys })),
        Err(e) => err(&req.id, "cache_unavailable", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "cache.keys" => Some(handle_cache_keys(state, req)),
        _ => None,
    }
}
