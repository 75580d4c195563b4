use std::fmt;

use lazy_static::lazy_static;
use log::{info, warn};
use regex::Regex;

use crate::{
    api::portfolio_manager::ScoreSource,
    config_store::Config,
    credentials,
    error::UpdateError,
    interval::month::Month,
    search::{BackwardSearch, SearchState},
    settings::RunSettings,
    updater::EndpointUpdate,
};

lazy_static! {
    static ref PROPERTY_ID: Regex = Regex::new(r"/property/(\d+)/metrics").unwrap();
}

const SEPARATOR: &str = "----------------------------------------------------------------------";

/// Pull the property id out of an endpoint url.
pub fn extract_property_id(endpoint: &str) -> Option<&str> {
    PROPERTY_ID
        .captures(endpoint)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Updated,
    Skipped,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub updated: usize,
    pub error: usize,
    pub skipped: usize,
}

impl Tally {
    pub fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Updated => self.updated += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Error => self.error += 1,
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processing complete. Updated: {}, Error: {}, Skipped: {}",
            self.updated, self.error, self.skipped
        )
    }
}

pub struct Orchestrator<S: ScoreSource> {
    settings: RunSettings,
    source: S,
}

impl<S: ScoreSource> Orchestrator<S> {
    pub fn new(settings: RunSettings, source: S) -> Self {
        Orchestrator { settings, source }
    }

    /// Update every section of the config file, searching back from
    /// `today`.  A failure to read or write the file stops the run, sections
    /// written before that stay written.
    pub fn run(&self, today: Month) -> Result<Tally, UpdateError> {
        let path = &self.settings.config_path;
        let mut config = Config::load(path)?;
        let sections = config.sections();
        let mut tally = Tally::default();
        if sections.is_empty() {
            warn!("No sections found in {}", path.display());
            return Ok(tally);
        }

        if self.park_polling(&mut config) {
            config.save(path)?;
            config = Config::load(path)?;
        }

        for section in &sections {
            let outcome = self.process_section(&mut config, section, today)?;
            tally.add(outcome);
        }

        info!("{}", tally);
        info!("{}", SEPARATOR);
        Ok(tally)
    }

    /// Set `polling_interval` to the parked value on every section that has
    /// one.  Return `true` if anything changed.
    pub fn park_polling(&self, config: &mut Config) -> bool {
        let parked = &self.settings.polling.parked;
        let mut modified = false;
        for section in config.sections() {
            if section == self.settings.skip_section {
                continue;
            }
            let stale = matches!(
                config.get(&section, "polling_interval"),
                Ok(current) if current != parked.as_str()
            );
            // the section exists, set can't fail
            if stale && config.set(&section, "polling_interval", parked).is_ok() {
                modified = true;
            }
        }
        modified
    }

    fn process_section(
        &self,
        config: &mut Config,
        section: &str,
        today: Month,
    ) -> Result<Outcome, UpdateError> {
        if section == self.settings.skip_section {
            info!("Skipping section {} as it's a weather endpoint.", section);
            return Ok(Outcome::Skipped);
        }
        let Ok(endpoint) = config.get(section, "endpoint") else {
            warn!("Section {} has no endpoint option. Skipping.", section);
            return Ok(Outcome::Skipped);
        };
        let Some(property_id) = extract_property_id(endpoint).map(str::to_string) else {
            warn!(
                "Could not extract property ID from endpoint in section {}. Skipping.",
                section
            );
            return Ok(Outcome::Skipped);
        };
        // no credentials: the search gives up without a request
        let credentials = credentials::resolve(config, section);

        let search = BackwardSearch::new(self.settings.max_years_to_check);
        let report = search.run(&self.source, &property_id, today, credentials.as_ref());
        match report.state {
            SearchState::Found { month, .. } => {
                let update = EndpointUpdate::new(
                    section,
                    &self.settings.base_url,
                    &property_id,
                    month,
                    &self.settings.polling,
                );
                update.commit(config, &self.settings.config_path)?;
                info!("{}", SEPARATOR);
                Ok(Outcome::Updated)
            }
            _ => Ok(Outcome::Error),
        }
    }
}
