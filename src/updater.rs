use std::path::Path;

use log::info;

use crate::{
    api::portfolio_manager::metrics_url,
    config_store::{Config, ConfigSection},
    error::UpdateError,
    interval::month::Month,
    settings::PollingSchedule,
};

/// All the writes that point one section at a new month, in the order they
/// are applied.  Nothing touches the config until [`EndpointUpdate::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointUpdate {
    pub section: String,
    pub endpoint: String,
    writes: Vec<(&'static str, String)>,
}

impl EndpointUpdate {
    /// Park the polling, switch it to the never schedule, then swap the
    /// endpoint.
    pub fn new(
        section: &str,
        base_url: &str,
        property_id: &str,
        month: Month,
        polling: &PollingSchedule,
    ) -> Self {
        let endpoint = metrics_url(base_url, property_id, month);
        EndpointUpdate {
            section: section.to_string(),
            endpoint: endpoint.clone(),
            writes: vec![
                ("polling_interval", polling.parked.clone()),
                ("polling_interval", polling.never.clone()),
                ("endpoint", endpoint),
            ],
        }
    }

    pub fn writes(&self) -> &[(&'static str, String)] {
        &self.writes
    }

    /// The new section record.  The current one is left alone.
    pub fn apply(&self, config: &Config) -> Result<ConfigSection, UpdateError> {
        let mut section = config
            .section(&self.section)
            .cloned()
            .ok_or_else(|| UpdateError::MissingSection(self.section.clone()))?;
        for (key, value) in &self.writes {
            section.set(key, value);
        }
        Ok(section)
    }

    /// Replace the section in one go and write the whole file once.
    pub fn commit(&self, config: &mut Config, path: &Path) -> Result<(), UpdateError> {
        let section = self.apply(config)?;
        config.replace_section(section)?;
        config.save(path)?;
        info!(
            "Updated endpoint for section: {} to {}",
            self.section, self.endpoint
        );
        Ok(())
    }
}
