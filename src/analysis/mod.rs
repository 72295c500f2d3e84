//! Offline analysis of captured login attempts
//!
//! Builds frequency rankings, time ranges and an hour-of-day histogram
//! from the records parsed out of an attack log.

pub mod counter;
pub mod stats;

pub use counter::FrequencyCounter;
pub use stats::{mask, AttackStats, HourBucket, RankedCredential, RankedValue};
