use std::{path::PathBuf, time::Duration};

use crate::{api::portfolio_manager::DEFAULT_BASE_URL, search::DEFAULT_MAX_YEARS_TO_CHECK};

/// Section that is never polled for a score.
pub const WEATHER_SECTION: &str = "rest://WeatherTest3";

/// The two `polling_interval` values the job uses as an on/off switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingSchedule {
    /// Set on every section before the search starts.
    pub parked: String,
    /// Cron schedule that never fires (Feb 31st).
    pub never: String,
}

impl Default for PollingSchedule {
    fn default() -> Self {
        PollingSchedule {
            parked: "999999".to_string(),
            never: "0 0 5 31 2 ?".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub config_path: PathBuf,
    pub log_path: PathBuf,
    pub base_url: String,
    pub skip_section: String,
    pub polling: PollingSchedule,
    pub max_years_to_check: u32,
    /// `None` keeps the http client default.
    pub timeout: Option<Duration>,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            config_path: PathBuf::from("inputs.conf"),
            log_path: PathBuf::from("update_log.log"),
            base_url: DEFAULT_BASE_URL.to_string(),
            skip_section: WEATHER_SECTION.to_string(),
            polling: PollingSchedule::default(),
            max_years_to_check: DEFAULT_MAX_YEARS_TO_CHECK,
            timeout: None,
        }
    }
}
