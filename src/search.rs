use log::{info, warn};

use crate::{
    api::portfolio_manager::{ScoreResult, ScoreSource},
    credentials::Credentials,
    interval::month::Month,
};

pub const DEFAULT_MAX_YEARS_TO_CHECK: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Searching { month: Month, years_checked: u32 },
    Found { month: Month, score: String },
    Exhausted,
}

impl SearchState {
    pub fn start(month: Month) -> SearchState {
        SearchState::Searching {
            month,
            years_checked: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SearchState::Searching { .. })
    }
}

/// Result of searching one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub state: SearchState,
    /// Number of requests made.
    pub attempts: u32,
}

/// Walk back one month at a time from a starting month until a score shows
/// up.  Gives up after `max_years_to_check` year boundaries have been
/// crossed, or after `12 * max_years_to_check + 1` months, whichever comes
/// first.
#[derive(Debug, Clone, Copy)]
pub struct BackwardSearch {
    pub max_years_to_check: u32,
}

impl Default for BackwardSearch {
    fn default() -> Self {
        BackwardSearch {
            max_years_to_check: DEFAULT_MAX_YEARS_TO_CHECK,
        }
    }
}

impl BackwardSearch {
    pub fn new(max_years_to_check: u32) -> Self {
        BackwardSearch { max_years_to_check }
    }

    /// Most months a single property can cost.
    pub fn max_attempts(&self) -> u32 {
        self.max_years_to_check.saturating_mul(12).saturating_add(1)
    }

    /// Transition on the answer for the month currently being searched.
    /// Terminal states don't move.
    pub fn step(&self, state: SearchState, result: &ScoreResult) -> SearchState {
        let SearchState::Searching {
            month,
            years_checked,
        } = state
        else {
            return state;
        };
        match result {
            ScoreResult::Found(score) => SearchState::Found {
                month,
                score: score.clone(),
            },
            ScoreResult::Empty | ScoreResult::HttpError(_) => {
                let years_checked = if month.month() == 1 {
                    years_checked.saturating_add(1)
                } else {
                    years_checked
                };
                if years_checked > self.max_years_to_check {
                    SearchState::Exhausted
                } else {
                    SearchState::Searching {
                        month: month.previous(),
                        years_checked,
                    }
                }
            }
        }
    }

    pub fn run<S: ScoreSource>(
        &self,
        source: &S,
        property_id: &str,
        start: Month,
        credentials: Option<&Credentials>,
    ) -> SearchReport {
        let Some(credentials) = credentials else {
            warn!(
                "No credentials for Property ID: {}, nothing fetched",
                property_id
            );
            return SearchReport {
                state: SearchState::Exhausted,
                attempts: 0,
            };
        };

        info!("Checking score - Property ID: {}", property_id);
        let mut state = SearchState::start(start);
        let mut attempts = 0;
        while let SearchState::Searching { month, .. } = state {
            if attempts == self.max_attempts() {
                state = SearchState::Exhausted;
                break;
            }
            let result = source.fetch(property_id, month, credentials);
            attempts += 1;
            match &result {
                ScoreResult::Found(score) => info!(
                    "Score found for Property ID: {}, month: {}, score: {}",
                    property_id, month, score
                ),
                ScoreResult::Empty => info!(
                    "No score found for Property ID: {}, month: {}. Trying previous month.",
                    property_id, month
                ),
                ScoreResult::HttpError(e) => warn!(
                    "HTTP error for Property ID: {}, month: {}: {}. Trying previous month.",
                    property_id, month, e
                ),
            }
            state = self.step(state, &result);
        }

        if state == SearchState::Exhausted {
            info!(
                "No score found for Property ID: {} after {} attempts, checked {} previous years",
                property_id, attempts, self.max_years_to_check
            );
        }
        SearchReport { state, attempts }
    }
}
