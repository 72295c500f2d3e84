pub mod csv_export;

pub use csv_export::{export_csv, write_csv, CsvRow};

use crate::analysis::{mask, AttackStats};
use std::io::{self, Write};
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while rendering reports or exporting records
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Message printed when a log holds no usable records
pub const NO_ATTACKS_MESSAGE: &str = "No attacks were found in the log file...great";

const HEAVY_RULE: &str = "============================================================";
const LIGHT_RULE: &str = "------------------------------------------------------------";
const BAR_GLYPH: &str = "█";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Console,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" => Ok(ReportFormat::Console),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format: {}", other)),
        }
    }
}

/// Renders attack statistics to a writer
///
/// Console output masks passwords; JSON output carries raw values for
/// machine consumption, like the CSV export.
pub struct ReportWriter<W: Write> {
    format: ReportFormat,
    writer: W,
}

impl ReportWriter<io::Stdout> {
    pub fn stdout(format: ReportFormat) -> Self {
        ReportWriter::new(format, io::stdout())
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(format: ReportFormat, writer: W) -> Self {
        ReportWriter { format, writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Report that the log held nothing to analyze
    pub fn write_empty(&mut self) -> Result<(), OutputError> {
        writeln!(self.writer, "{}", NO_ATTACKS_MESSAGE)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_stats(&mut self, stats: &AttackStats) -> Result<(), OutputError> {
        match self.format {
            ReportFormat::Json => {
                let json = serde_json::to_string_pretty(stats)?;
                writeln!(self.writer, "{}", json)?;
            }
            ReportFormat::Console => self.write_console(stats)?,
        }
        self.writer.flush()?;
        Ok(())
    }

    fn write_console(&mut self, stats: &AttackStats) -> io::Result<()> {
        let w = &mut self.writer;

        writeln!(w, "\n{}", HEAVY_RULE)?;
        writeln!(w, "!----- Honeypot Attack Analysis -----!")?;
        writeln!(w, "{}", HEAVY_RULE)?;

        writeln!(w, "\nTotal Login Attempts: {}", stats.total_attempts)?;
        writeln!(w, "Unique IP addresses: {}", stats.unique_ips)?;
        writeln!(
            w,
            "Bot Attempts: {} ({:.1}%)",
            stats.bot_attempts, stats.bot_percentage
        )?;
        writeln!(w, "-First Attack: {}", stats.first_attack.format("%Y-%m-%d %H:%M"))?;
        writeln!(w, "-Last Attack: {}", stats.last_attack.format("%Y-%m-%d %H:%M"))?;

        Self::section(w, &format!("Top {} Most Active IPs", stats.top_n))?;
        for entry in &stats.top_ips {
            writeln!(w, "    {:20} - {:4} attempts", entry.value, entry.count)?;
        }

        Self::section(w, &format!("Top {} Most Tried Username", stats.top_n))?;
        for entry in &stats.top_usernames {
            writeln!(w, "    {:20} - {:4} attempts", entry.value, entry.count)?;
        }

        Self::section(w, &format!("Top {} Most Tried Passwords", stats.top_n))?;
        for entry in &stats.top_passwords {
            writeln!(w, "    {:15} - {:4} attempts", mask(&entry.value), entry.count)?;
        }

        Self::section(w, &format!("Top {} Username:Password Combinations", stats.top_n))?;
        for entry in &stats.top_credentials {
            writeln!(
                w,
                "    {:15} : {:15} - {:4} attempts",
                entry.username,
                mask(&entry.password),
                entry.count
            )?;
        }

        Self::section(w, "Attack By Hour of Day")?;
        for bucket in &stats.hourly {
            let bar = BAR_GLYPH.repeat(stats.bar_length(bucket.count));
            writeln!(w, "    {:02}:00 - {:4} {}", bucket.hour, bucket.count, bar)?;
        }

        writeln!(w, "\n{}\n", HEAVY_RULE)?;
        Ok(())
    }

    fn section(w: &mut W, title: &str) -> io::Result<()> {
        writeln!(w, "\n{}", LIGHT_RULE)?;
        writeln!(w, "!----- {} -----!", title)?;
        writeln!(w, "{}", LIGHT_RULE)
    }
}
