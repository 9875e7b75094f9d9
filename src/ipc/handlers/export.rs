use crate::export::{discover_columns, export_csv, export_file_name, CSV_MIME};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::optional_str;
use crate::ipc::types::{AppState, Request};
use chrono::Utc;
use serde_json::json;
use std::path::{Path, PathBuf};

fn write_text_file(out: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(out, contents)
}

fn handle_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let records = state.roster.records();
    let file_name = export_file_name(Utc::now().date_naive());

    let csv = match export_csv(records) {
        Ok(Some(csv)) => csv,
        Ok(None) => {
            log::debug!("csv export skipped: no records");
            return ok(
                &req.id,
                json!({ "exported": false, "fileName": file_name, "rowsExported": 0 }),
            );
        }
        Err(e) => {
            log::error!("csv export failed: {:#}", e);
            return err(&req.id, "export_failed", format!("{e:#}"), None);
        }
    };

    let mut result = json!({
        "exported": true,
        "fileName": file_name,
        "mimeType": CSV_MIME,
        "columns": discover_columns(records),
        "rowsExported": records.len(),
    });

    match optional_str(req, "outDir") {
        Some(dir) => {
            let out = PathBuf::from(&dir).join(&file_name);
            if let Err(e) = write_text_file(&out, &csv) {
                return err(
                    &req.id,
                    "io_failed",
                    e.to_string(),
                    Some(json!({ "path": out.to_string_lossy() })),
                );
            }
            log::info!("exported {} records to {}", records.len(), out.to_string_lossy());
            result["path"] = json!(out.to_string_lossy());
        }
        None => {
            result["csv"] = json!(csv);
        }
    }

    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "export.csv" => Some(handle_export_csv(state, req)),
        _ => None,
    }
}
