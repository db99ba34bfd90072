//! Runner settings read from the environment.

use std::env;
use std::path::PathBuf;

use crate::dirs;

/// Environment variables, all optional:
///
/// - `ABILITY_SIM_DATA_DIR`: content directory; embedded content when unset
/// - `ABILITY_SIM_LOG_DIR`: where `sim.log` is written
/// - `ABILITY_SIM_REPORT_DIR`: default destination for `run --save`
/// - `ABILITY_SIM_LOG_STDERR`: also log to stderr when set to `1` or `true`
#[derive(Clone, Debug)]
pub struct SimConfig {
    pub data_dir: Option<PathBuf>,
    pub log_dir: PathBuf,
    pub report_dir: PathBuf,
    pub log_to_stderr: bool,
}

impl SimConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
        };
        Self {
            data_dir: path("ABILITY_SIM_DATA_DIR"),
            log_dir: path("ABILITY_SIM_LOG_DIR").unwrap_or_else(dirs::log_dir),
            report_dir: path("ABILITY_SIM_REPORT_DIR").unwrap_or_else(dirs::report_dir),
            log_to_stderr: lookup("ABILITY_SIM_LOG_STDERR")
                .is_some_and(|value| matches!(value.trim(), "1" | "true" | "TRUE" | "yes")),
        }
    }
}
