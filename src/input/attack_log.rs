use crate::models::{AttackRecord, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use regex::Regex;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading an attack log
#[derive(Error, Debug)]
pub enum InputError {
    #[error("{0} not found")]
    LogNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid field pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Field extractor for attack-log lines
///
/// Each field is located independently, so field order inside the line
/// does not matter. A line is accepted only when the timestamp, IP,
/// username and password are all present; the bot marker is optional.
pub struct LogLineParser {
    timestamp: Regex,
    ip: Regex,
    username: Regex,
    password: Regex,
    bot: Regex,
}

impl LogLineParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(LogLineParser {
            timestamp: Regex::new(r"\[(.*?)\]")?,
            ip: Regex::new(r"IP: ([\d.]+)")?,
            username: Regex::new(r"Username: (\S+)")?,
            password: Regex::new(r"Password: (\S+)")?,
            bot: Regex::new(r"Bot: (\w+)")?,
        })
    }

    /// Parse one line, returning `None` if a required field is missing
    pub fn parse_line(&self, line: &str) -> Option<AttackRecord> {
        let timestamp = Self::capture(&self.timestamp, line)?;
        let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;
        let source_ip = Self::capture(&self.ip, line)?;
        let username = Self::capture(&self.username, line)?;
        let password = Self::capture(&self.password, line)?;
        let is_bot = Self::capture(&self.bot, line) == Some("True");

        Some(AttackRecord {
            timestamp,
            source_ip: source_ip.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            is_bot,
        })
    }

    fn capture<'a>(pattern: &Regex, line: &'a str) -> Option<&'a str> {
        pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Records recovered from one pass over an attack log
#[derive(Debug, Default)]
pub struct ParsedLog {
    /// Accepted records, in file order
    pub records: Vec<AttackRecord>,
    /// Non-blank lines that did not yield a record
    pub dropped: usize,
}

/// Reads a whole attack log into memory
pub struct AttackLogReader {
    file_path: PathBuf,
    parser: LogLineParser,
}

impl AttackLogReader {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Result<Self, InputError> {
        Ok(AttackLogReader {
            file_path: file_path.as_ref().to_path_buf(),
            parser: LogLineParser::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Parse every line of the log file
    ///
    /// A missing file is reported as [`InputError::LogNotFound`] so the
    /// caller can stop before computing statistics.
    pub fn read_all(&self) -> Result<ParsedLog, InputError> {
        let file = File::open(&self.file_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => InputError::LogNotFound(self.file_path.clone()),
            _ => InputError::Io(e),
        })?;

        let parsed = self.parse_reader(BufReader::new(file))?;
        log::info!(
            "Parsed {} record(s) from {:?} ({} line(s) dropped)",
            parsed.records.len(),
            self.file_path,
            parsed.dropped
        );
        Ok(parsed)
    }

    /// Parse records from any buffered source
    ///
    /// Invalid UTF-8 is replaced rather than rejected so one corrupt line
    /// cannot abort the whole run.
    pub fn parse_reader<R: BufRead>(&self, mut reader: R) -> Result<ParsedLog, InputError> {
        let mut parsed = ParsedLog::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let bytes_read = reader.read_until(b'\n', &mut buf)?;
            if bytes_read == 0 {
                break; // EOF
            }

            let line = String::from_utf8_lossy(&buf);
            if line.trim().is_empty() {
                continue;
            }

            match self.parser.parse_line(&line) {
                Some(record) => parsed.records.push(record),
                None => {
                    log::debug!("Dropping malformed line: {}", line.trim_end());
                    parsed.dropped += 1;
                }
            }
        }

        Ok(parsed)
    }
}
