pub mod analysis;
pub mod capture;
pub mod config;
pub mod input;
pub mod models;
pub mod output;

// Re-export commonly used types
pub use analysis::{mask, AttackStats, FrequencyCounter};
pub use capture::{classify_user_agent, CaptureService, LogWriter, ResponsePicker, Submission};
pub use config::Config;
pub use input::{AttackLogReader, LogLineParser, ParsedLog};
pub use models::{AttackRecord, LoginAttempt};
pub use output::{export_csv, ReportFormat, ReportWriter};
