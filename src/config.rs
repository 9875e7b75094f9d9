/*!
Process configuration, read from the environment at startup.
*/
use std::path::PathBuf;

use simplelog::LevelFilter;

use crate::aggregate::DEFAULT_TOP_FEES;

pub const ENV_WORKSPACE: &str = "STUDENTD_WORKSPACE";
pub const ENV_LOG: &str = "STUDENTD_LOG";
pub const ENV_TOP_FEES: &str = "STUDENTD_TOP_FEES";

#[derive(Debug, Clone)]
pub struct Cfg {
    /// Workspace opened before the first request, if any.
    pub workspace: Option<PathBuf>,
    pub log_level: LevelFilter,
    /// Default size of the fee chart.
    pub top_fees: usize,
    /// Settings that were present but unusable. Logged once logging is up.
    pub ignored: Vec<String>,
}

impl Default for Cfg {
    fn default() -> Self {
        Self {
            workspace: None,
            log_level: LevelFilter::Warn,
            top_fees: DEFAULT_TOP_FEES,
            ignored: Vec::new(),
        }
    }
}

fn parse_level(s: &str) -> Option<LevelFilter> {
    match s.trim().to_ascii_lowercase().as_str() {
        "max" => Some(LevelFilter::max()),
        "trace" => Some(LevelFilter::Trace),
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        "off" => Some(LevelFilter::Off),
        _ => None,
    }
}

impl Cfg {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the defaults, then overrides whatever `lookup` provides.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut c = Self::default();

        if let Some(s) = lookup(ENV_WORKSPACE) {
            if s.trim().is_empty() {
                c.ignored.push(format!("{} is empty", ENV_WORKSPACE));
            } else {
                c.workspace = Some(PathBuf::from(s.trim()));
            }
        }
        if let Some(s) = lookup(ENV_LOG) {
            match parse_level(&s) {
                Some(level) => c.log_level = level,
                None => c.ignored.push(format!("unknown {} level {:?}", ENV_LOG, &s)),
            }
        }
        if let Some(s) = lookup(ENV_TOP_FEES) {
            match s.trim().parse::<usize>() {
                Ok(n) if n > 0 => c.top_fees = n,
                _ => c.ignored.push(format!("{} must be a positive integer, got {:?}", ENV_TOP_FEES, &s)),
            }
        }

        c
    }
}
