//! One-shot download of the remote contact list.
//!
//! The fetch runs on its own worker thread and delivers exactly one
//! [`LoadOutcome`] back to the UI loop through a channel. The UI drains the
//! channel after handling pending input, and a result that arrives after the
//! UI went away is dropped.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::contact::Contact;

pub const DEFAULT_SOURCE_URL: &str =
    "https://drive.google.com/uc?export=download&id=1-KO-9GA3NzSgIc1dkAsNm8Dqw0fuPxcR";

const WORKER_NAME: &str = "rdial-fetch";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered {status}: {reason}")]
    Status { status: u16, reason: String },
    #[error("malformed contact list: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("fetch worker stopped: {0}")]
    Worker(String),
}

pub type LoadOutcome = Result<Vec<Contact>, FetchError>;

/// Where and how to download the contact list.
#[derive(Debug, Clone)]
pub struct Source {
    pub url: String,
    pub timeout: Option<Duration>,
}

impl Source {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn client(&self) -> Result<Client, FetchError> {
        let mut builder = Client::builder().user_agent(concat!("rdial/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

/// Decode a response body into contacts.
///
/// A literal `null` body is read as an empty list, the same as `[]`.
pub fn parse_contacts(body: &str) -> Result<Vec<Contact>, FetchError> {
    let decoded: Option<Vec<Contact>> = serde_json::from_str(body)?;
    Ok(decoded.unwrap_or_default())
}

pub fn fetch(client: &Client, url: &str) -> Result<Vec<Contact>, FetchError> {
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("unknown").to_string(),
        });
    }

    let body = response.text()?;
    parse_contacts(&body)
}

/// Fetch synchronously on the calling thread.
pub fn load(source: &Source) -> LoadOutcome {
    let client = source.client()?;
    fetch(&client, &source.url)
}

/// Handle to the single background fetch of a session.
pub struct Loader {
    rx: Option<Receiver<LoadOutcome>>,
    #[cfg(test)]
    worker: Option<thread::JoinHandle<()>>,
}

impl Loader {
    pub fn spawn(source: Source) -> Self {
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                debug!(url = %source.url, "fetching contacts");
                let outcome = load(&source);
                match &outcome {
                    Ok(contacts) => info!(count = contacts.len(), "contacts downloaded"),
                    Err(err) => error!(error = %err, "error loading contacts"),
                }
                if tx.send(outcome).is_err() {
                    debug!("contact list arrived after the UI closed; dropping it");
                }
            });

        match spawned {
            Ok(_worker) => Self {
                rx: Some(rx),
                #[cfg(test)]
                worker: Some(_worker),
            },
            Err(err) => {
                error!(error = %err, "failed to start fetch worker");
                let (tx, rx) = mpsc::channel();
                let _ = tx.send(Err(FetchError::Worker(err.to_string())));
                Self {
                    rx: Some(rx),
                    #[cfg(test)]
                    worker: None,
                }
            }
        }
    }

    /// A loader that already holds its outcome.
    #[cfg(test)]
    pub fn ready(outcome: LoadOutcome) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(outcome);
        Self {
            rx: Some(rx),
            worker: None,
        }
    }

    /// Take the outcome if the worker has delivered it. Yields `Some` at most
    /// once per loader.
    pub fn poll(&mut self) -> Option<LoadOutcome> {
        let rx = self.rx.as_ref()?;
        match rx.try_recv() {
            Ok(outcome) => {
                self.rx = None;
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.rx = None;
                Some(Err(FetchError::Worker(
                    "worker exited without a result".to_string(),
                )))
            }
        }
    }
}
