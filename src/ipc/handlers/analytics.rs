use crate::aggregate;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn parse_top_n(req: &Request, default: usize) -> Result<usize, serde_json::Value> {
    match req.params.get("topN") {
        None | Some(serde_json::Value::Null) => Ok(default),
        Some(v) => v
            .as_u64()
            .filter(|n| *n > 0)
            .map(|n| n as usize)
            .ok_or_else(|| err(&req.id, "bad_params", "topN must be a positive integer", None)),
    }
}

fn handle_analytics_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let summary = aggregate::dashboard_summary(state.roster.records());
    ok(&req.id, json!(summary))
}

fn handle_analytics_charts(state: &mut AppState, req: &Request) -> serde_json::Value {
    let top_n = match parse_top_n(req, state.cfg.top_fees) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    let records = state.roster.records();
    ok(
        &req.id,
        json!({
            "programs": aggregate::program_distribution(records),
            "genders": aggregate::gender_distribution(records),
            "semesters": aggregate::semester_distribution(records),
            "fees": aggregate::top_fee_records(records, top_n),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.summary" => Some(handle_analytics_summary(state, req)),
        "analytics.charts" => Some(handle_analytics_charts(state, req)),
        _ => None,
    }
}
