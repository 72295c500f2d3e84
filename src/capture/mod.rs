//! Login capture for the fake sign-on page
//!
//! Every submission is classified, written to the attack log and answered
//! with a generic failure message after a random delay. Nobody is ever
//! signed in.

pub mod log_writer;
pub mod server;

pub use log_writer::LogWriter;
pub use server::router;

use crate::config::CaptureConfig;
use crate::models::record::MISSING_FIELD;
use crate::models::LoginAttempt;
use chrono::Local;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Errors raised while recording a login attempt
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Attack log writer is not running")]
    WriterClosed,
}

/// User-agent fragments that mark a client as automated
pub const BOT_MARKERS: [&str; 6] = ["curl", "python", "wget", "scanner", "bot", "scraper"];

/// Failure messages shown after every submission
pub const FAILURE_MESSAGES: [&str; 4] = [
    "We don't recognize that username or password. Please try again.",
    "Your username or password is incorrect. Please try again.",
    "Sign on failed. Please verify your username and password.",
    "We're unable to sign you on. Please check your credentials and try again.",
];

/// Crude bot heuristic: case-insensitive substring match on the user agent
pub fn classify_user_agent(user_agent: Option<&str>) -> bool {
    match user_agent {
        Some(ua) => {
            let ua = ua.to_lowercase();
            BOT_MARKERS.iter().any(|marker| ua.contains(marker))
        }
        None => false,
    }
}

/// A login form submission plus what the transport told us about the client
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub username: Option<String>,
    pub password: Option<String>,
    pub source_ip: String,
    pub user_agent: Option<String>,
}

/// Message and delay chosen for one response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureResponse {
    pub message: &'static str,
    pub delay: Duration,
}

/// Picks failure responses from a seedable random source
pub struct ResponsePicker {
    rng: Mutex<StdRng>,
    delay_ms: RangeInclusive<u64>,
}

impl ResponsePicker {
    pub fn new(delay_ms: RangeInclusive<u64>) -> Self {
        Self::with_rng(delay_ms, StdRng::from_os_rng())
    }

    /// Use a caller-supplied generator, e.g. a fixed seed in tests
    pub fn with_rng(delay_ms: RangeInclusive<u64>, rng: StdRng) -> Self {
        ResponsePicker {
            rng: Mutex::new(rng),
            delay_ms,
        }
    }

    pub fn pick(&self) -> FailureResponse {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let message = FAILURE_MESSAGES[rng.random_range(0..FAILURE_MESSAGES.len())];
        let delay = Duration::from_millis(rng.random_range(self.delay_ms.clone()));
        FailureResponse { message, delay }
    }
}

/// Records submissions and produces the deceptive response
pub struct CaptureService {
    log: LogWriter,
    picker: ResponsePicker,
}

impl CaptureService {
    pub fn new(log: LogWriter, picker: ResponsePicker) -> Self {
        CaptureService { log, picker }
    }

    /// Build the service and its log writer task from configuration
    pub fn from_config(config: &CaptureConfig) -> (Self, JoinHandle<()>) {
        let (log, task) = LogWriter::spawn(config.log_path.clone(), config.queue_capacity);
        let picker = ResponsePicker::new(config.delay_range());
        (CaptureService::new(log, picker), task)
    }

    /// Record one submission and return the failure message to show
    ///
    /// The line is appended exactly once. The artificial delay is applied
    /// whether or not the write succeeded so both paths take the same time.
    pub async fn capture(&self, submission: Submission) -> Result<&'static str, CaptureError> {
        let attempt = Self::to_attempt(submission);
        let response = self.picker.pick();

        log::info!(
            "Login attempt from {} (user: {}, bot: {})",
            attempt.source_ip,
            attempt.username,
            attempt.is_bot
        );

        let written = self.log.append(attempt.to_log_line()).await;
        tokio::time::sleep(response.delay).await;
        written?;

        Ok(response.message)
    }

    fn to_attempt(submission: Submission) -> LoginAttempt {
        let is_bot = classify_user_agent(submission.user_agent.as_deref());
        LoginAttempt {
            timestamp: Local::now().naive_local(),
            source_ip: single_line(Some(submission.source_ip)),
            username: single_line(submission.username),
            password: single_line(submission.password),
            user_agent: submission.user_agent.map(|ua| single_line(Some(ua))),
            is_bot,
        }
    }
}

/// Keep a field on one log line; absent or empty fields become `-`
fn single_line(field: Option<String>) -> String {
    match field {
        Some(value) if !value.is_empty() => value.replace(['\r', '\n'], " "),
        _ => MISSING_FIELD.to_string(),
    }
}
