pub mod record;

pub use record::{AttackRecord, LoginAttempt, TIMESTAMP_FORMAT};
