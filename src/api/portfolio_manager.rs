//! Client for the ENERGY STAR Portfolio Manager property metrics service.
//!
//! One request is made per property and month:
//!
//! `GET {base}/property/{id}/metrics?year={year}&month={month}` with header
//! `PM-Metrics: score`.  The response is an xml document.  When a score
//! exists for the month, the flattened text of the document is the score,
//! otherwise the document has no text at all.
//!
use std::time::Duration;

use log::debug;
use quick_xml::{events::Event, Reader};
use reqwest::{
    blocking::{Client, RequestBuilder},
    StatusCode,
};
use thiserror::Error;

use crate::{credentials::Credentials, interval::month::Month};

pub const DEFAULT_BASE_URL: &str = "https://portfoliomanager.energystar.gov/ws";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(StatusCode),

    #[error("invalid markup: {0}")]
    Markup(#[from] quick_xml::Error),
}

/// What one request for a (property, month) produced.
#[derive(Debug)]
pub enum ScoreResult {
    Found(String),
    Empty,
    HttpError(FetchError),
}

/// Anything that can answer "is there a score for this property and month".
pub trait ScoreSource {
    fn fetch(&self, property_id: &str, month: Month, credentials: &Credentials) -> ScoreResult;
}

/// The url for the metrics of a property and month.  This is also the
/// value that ends up in the `endpoint` option of the config file.
pub fn metrics_url(base_url: &str, property_id: &str, month: Month) -> String {
    format!(
        "{}/property/{}/metrics?year={}&month={}",
        base_url.trim_end_matches('/'),
        property_id,
        month.year(),
        month.month()
    )
}

/// Concatenate all the text (and CDATA) content of an xml document, trimmed.
pub fn flatten_text(body: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(body);
    let mut out = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => out.push_str(&e.unescape()?),
            Event::CData(e) => out.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out.trim().to_string())
}

/// Classify a response body.  Markup that doesn't parse is reported the
/// same way as a failed request.
pub fn parse_score(body: &str) -> ScoreResult {
    match flatten_text(body) {
        Ok(text) if text.is_empty() => ScoreResult::Empty,
        Ok(text) => ScoreResult::Found(text),
        Err(e) => ScoreResult::HttpError(FetchError::Markup(e)),
    }
}

pub struct PortfolioManagerClient {
    client: Client,
    base_url: String,
}

impl PortfolioManagerClient {
    /// Use `timeout` to override the default timeout of the blocking client.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(PortfolioManagerClient {
            client: builder.build()?,
            base_url: base_url.to_string(),
        })
    }

    /// The metrics request for one property and month, ready to send.
    pub fn request(
        &self,
        property_id: &str,
        month: Month,
        credentials: &Credentials,
    ) -> RequestBuilder {
        let url = metrics_url(&self.base_url, property_id, month);
        debug!("GET {}", url);
        self.client
            .get(url)
            .basic_auth(&credentials.user, Some(&credentials.password))
            .header("PM-Metrics", "score")
    }
}

/// Classify a response.  Any status outside of 2xx is a failure whatever
/// the body says.
pub fn classify(status: StatusCode, body: &str) -> ScoreResult {
    if !status.is_success() {
        return ScoreResult::HttpError(FetchError::Status(status));
    }
    parse_score(body)
}

impl ScoreSource for PortfolioManagerClient {
    fn fetch(&self, property_id: &str, month: Month, credentials: &Credentials) -> ScoreResult {
        let response = match self.request(property_id, month, credentials).send() {
            Ok(response) => response,
            Err(e) => return ScoreResult::HttpError(e.into()),
        };
        let status = response.status();
        if !status.is_success() {
            return classify(status, "");
        }
        match response.text() {
            Ok(body) => classify(status, &body),
            Err(e) => ScoreResult::HttpError(e.into()),
        }
    }
}

/// A source that replays canned answers, for tests.
#[cfg(test)]
pub(crate) mod scripted {
    use std::{cell::RefCell, collections::VecDeque};

    use super::*;

    #[derive(Debug, Clone)]
    pub enum Canned {
        Found(&'static str),
        Empty,
        Status(u16),
    }

    /// Answers from the script in order, then `Empty` forever.
    #[derive(Default)]
    pub struct ScriptedSource {
        script: RefCell<VecDeque<Canned>>,
        pub calls: RefCell<Vec<(String, Month)>>,
    }

    impl ScriptedSource {
        pub fn new(script: Vec<Canned>) -> Self {
            ScriptedSource {
                script: RefCell::new(script.into()),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl ScoreSource for ScriptedSource {
        fn fetch(&self, property_id: &str, month: Month, _: &Credentials) -> ScoreResult {
            self.calls.borrow_mut().push((property_id.to_string(), month));
            match self.script.borrow_mut().pop_front() {
                Some(Canned::Found(s)) => ScoreResult::Found(s.to_string()),
                Some(Canned::Status(code)) => ScoreResult::HttpError(FetchError::Status(
                    StatusCode::from_u16(code).unwrap(),
                )),
                Some(Canned::Empty) | None => ScoreResult::Empty,
            }
        }
    }
}
