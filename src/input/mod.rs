pub mod attack_log;

pub use attack_log::{AttackLogReader, InputError, LogLineParser, ParsedLog};
