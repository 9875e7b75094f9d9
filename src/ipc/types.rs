use std::path::PathBuf;

use serde::Deserialize;

use crate::config::Cfg;
use crate::roster::Roster;
use crate::store::SqliteStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub cfg: Cfg,
    pub workspace: Option<PathBuf>,
    pub store: Option<SqliteStore>,
    pub roster: Roster,
}

impl AppState {
    pub fn new(cfg: Cfg) -> Self {
        Self {
            cfg,
            workspace: None,
            store: None,
            roster: Roster::default(),
        }
    }
}
