//! Attack records and the attack-log line format
//!
//! One captured login attempt becomes one line in the attack log:
//!
//! ```text
//! [2024-03-01 14:22:07] IP: 203.0.113.9 | Username: admin | Password: hunter2 | UA: curl/8.4.0 | Bot: True
//! ```
//!
//! Fields are written verbatim. A username or password containing `|`,
//! whitespace or another field label will not parse back cleanly; the
//! analyzer drops or truncates such lines instead of failing.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Timestamp layout used in the attack log and the CSV export
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder written for a field the client did not send
pub const MISSING_FIELD: &str = "-";

/// A login submission as seen by the capture endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttempt {
    pub timestamp: NaiveDateTime,
    pub source_ip: String,
    pub username: String,
    pub password: String,
    pub user_agent: Option<String>,
    pub is_bot: bool,
}

/// One parsed login attempt recovered from the attack log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackRecord {
    pub timestamp: NaiveDateTime,
    pub source_ip: String,
    pub username: String,
    pub password: String,
    pub is_bot: bool,
}

impl LoginAttempt {
    /// Render the attempt as a newline-terminated attack-log line
    pub fn to_log_line(&self) -> String {
        format!(
            "[{}] IP: {} | Username: {} | Password: {} | UA: {} | Bot: {}\n",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.source_ip,
            self.username,
            self.password,
            self.user_agent.as_deref().unwrap_or(MISSING_FIELD),
            bool_token(self.is_bot),
        )
    }
}

impl From<&LoginAttempt> for AttackRecord {
    fn from(attempt: &LoginAttempt) -> Self {
        AttackRecord {
            timestamp: attempt.timestamp,
            source_ip: attempt.source_ip.clone(),
            username: attempt.username.clone(),
            password: attempt.password.clone(),
            is_bot: attempt.is_bot,
        }
    }
}

impl AttackRecord {
    pub fn timestamp_text(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// `True`/`False` literal used for booleans in the log and CSV
pub fn bool_token(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}
