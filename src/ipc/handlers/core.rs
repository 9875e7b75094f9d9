use crate::ipc::error::{err, ok, store_err};
use crate::ipc::types::{AppState, Request};
use crate::store::SqliteStore;
use anyhow::Context;
use serde_json::json;
use std::path::{Path, PathBuf};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

/// Opens (or creates) the store under `path` and makes it current.
///
/// The roster is emptied; callers load it with a refresh.
pub fn open_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<()> {
    let store = SqliteStore::open(path)
        .with_context(|| format!("failed to open workspace {}", path.to_string_lossy()))?;
    log::info!("workspace opened at {}", store.path().to_string_lossy());
    state.workspace = Some(path.to_path_buf());
    state.store = Some(store);
    state.roster.clear();
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

    if let Err(e) = open_workspace(state, &path) {
        log::error!("{:#}", e);
        return err(&req.id, "db_open_failed", format!("{e:#}"), None);
    }

    let AppState { store, roster, .. } = state;
    let Some(store) = store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match roster.refresh(store) {
        Ok(count) => ok(
            &req.id,
            json!({ "workspacePath": path.to_string_lossy(), "recordCount": count }),
        ),
        Err(e) => store_err(&req.id, "failed to load student records", &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
