//! Aggregate statistics over a parsed attack log

use super::counter::FrequencyCounter;
use crate::models::AttackRecord;
use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;

/// Target width of the longest histogram bar
pub const HISTOGRAM_WIDTH: usize = 40;

/// Number of leading characters left visible by [`mask`]
pub const MASK_VISIBLE: usize = 3;

/// A ranked value and how often it occurred
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedValue {
    pub value: String,
    pub count: usize,
}

/// A ranked username/password pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCredential {
    pub username: String,
    pub password: String,
    pub count: usize,
}

/// Attempts seen during one hour of the day, across all dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourBucket {
    pub hour: u32,
    pub count: usize,
}

/// Summary of every attack record in a log
#[derive(Debug, Clone, Serialize)]
pub struct AttackStats {
    /// Requested length of each ranking
    pub top_n: usize,
    pub total_attempts: usize,
    pub unique_ips: usize,
    pub bot_attempts: usize,
    pub bot_percentage: f64,
    pub first_attack: NaiveDateTime,
    pub last_attack: NaiveDateTime,
    pub top_ips: Vec<RankedValue>,
    pub top_usernames: Vec<RankedValue>,
    pub top_passwords: Vec<RankedValue>,
    pub top_credentials: Vec<RankedCredential>,
    /// Always 24 buckets, hour 0 first
    pub hourly: Vec<HourBucket>,
}

impl AttackStats {
    /// Compute statistics, or `None` when there are no records
    pub fn compute(records: &[AttackRecord], top_n: usize) -> Option<Self> {
        let first_attack = records.iter().map(|r| r.timestamp).min()?;
        let last_attack = records.iter().map(|r| r.timestamp).max()?;

        let total_attempts = records.len();
        let bot_attempts = records.iter().filter(|r| r.is_bot).count();
        let bot_percentage = bot_attempts as f64 / total_attempts as f64 * 100.0;

        let ips: FrequencyCounter<&str> = records.iter().map(|r| r.source_ip.as_str()).collect();
        let usernames: FrequencyCounter<&str> =
            records.iter().map(|r| r.username.as_str()).collect();
        let passwords: FrequencyCounter<&str> =
            records.iter().map(|r| r.password.as_str()).collect();
        let credentials: FrequencyCounter<(&str, &str)> = records
            .iter()
            .map(|r| (r.username.as_str(), r.password.as_str()))
            .collect();

        let mut hourly: Vec<HourBucket> = (0..24).map(|hour| HourBucket { hour, count: 0 }).collect();
        for record in records {
            hourly[record.timestamp.hour() as usize].count += 1;
        }

        Some(AttackStats {
            top_n,
            total_attempts,
            unique_ips: ips.len(),
            bot_attempts,
            bot_percentage,
            first_attack,
            last_attack,
            top_ips: Self::ranked(&ips, top_n),
            top_usernames: Self::ranked(&usernames, top_n),
            top_passwords: Self::ranked(&passwords, top_n),
            top_credentials: credentials
                .most_common(top_n)
                .into_iter()
                .map(|((username, password), count)| RankedCredential {
                    username: username.to_string(),
                    password: password.to_string(),
                    count,
                })
                .collect(),
            hourly,
        })
    }

    fn ranked(counter: &FrequencyCounter<&str>, top_n: usize) -> Vec<RankedValue> {
        counter
            .most_common(top_n)
            .into_iter()
            .map(|(value, count)| RankedValue {
                value: value.to_string(),
                count,
            })
            .collect()
    }

    /// Length of the histogram bar drawn for `count`
    ///
    /// The busiest hour is scaled to roughly [`HISTOGRAM_WIDTH`] characters;
    /// quiet logs are drawn one character per attempt.
    pub fn bar_length(&self, count: usize) -> usize {
        let busiest = self.hourly.iter().map(|b| b.count).max().unwrap_or(0);
        count / std::cmp::max(1, busiest / HISTOGRAM_WIDTH)
    }
}

/// Show the first three characters and star out the rest
pub fn mask(secret: &str) -> String {
    let hidden = secret.chars().count().saturating_sub(MASK_VISIBLE);
    let mut masked: String = secret.chars().take(MASK_VISIBLE).collect();
    masked.push_str(&"*".repeat(hidden));
    masked
}
