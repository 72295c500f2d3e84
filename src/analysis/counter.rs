//! Frequency counting with first-seen ordering

use indexmap::IndexMap;
use std::hash::Hash;

/// Counts occurrences while remembering the order keys first appeared
///
/// [`most_common`](FrequencyCounter::most_common) sorts stably, so keys
/// with equal counts come out in the order they were first seen.
#[derive(Debug, Clone)]
pub struct FrequencyCounter<K> {
    counts: IndexMap<K, usize>,
}

impl<K: Eq + Hash + Clone> FrequencyCounter<K> {
    pub fn new() -> Self {
        FrequencyCounter {
            counts: IndexMap::new(),
        }
    }

    pub fn add(&mut self, key: K) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    pub fn get(&self, key: &K) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn max_count(&self) -> usize {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// The `n` most frequent keys, highest count first
    pub fn most_common(&self, n: usize) -> Vec<(K, usize)> {
        let mut ranked: Vec<(K, usize)> = self
            .counts
            .iter()
            .map(|(key, count)| (key.clone(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

impl<K: Eq + Hash + Clone> Default for FrequencyCounter<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> FromIterator<K> for FrequencyCounter<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut counter = FrequencyCounter::new();
        for key in iter {
            counter.add(key);
        }
        counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_ranking() {
        let counter: FrequencyCounter<&str> =
            ["b", "a", "a", "c", "a", "b"].into_iter().collect();

        assert_eq!(counter.len(), 3);
        assert_eq!(counter.get(&"a"), 3);
        assert_eq!(counter.get(&"z"), 0);
        assert_eq!(counter.max_count(), 3);
        assert_eq!(counter.most_common(2), vec![("a", 3), ("b", 2)]);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let counter: FrequencyCounter<&str> =
            ["x", "y", "z", "y", "x", "z"].into_iter().collect();
        assert_eq!(counter.most_common(10), vec![("x", 2), ("y", 2), ("z", 2)]);
    }

    #[test]
    fn test_empty() {
        let counter: FrequencyCounter<String> = FrequencyCounter::new();
        assert!(counter.is_empty());
        assert_eq!(counter.max_count(), 0);
        assert!(counter.most_common(10).is_empty());
    }

    #[test]
    fn test_late_climber_passes_earlier_keys() {
        let mut counter = FrequencyCounter::new();
        for key in ["p", "q", "r", "r", "q", "r", "s"] {
            counter.add(key);
        }

        assert_eq!(counter.most_common(4), vec![("r", 3), ("q", 2), ("p", 1), ("s", 1)]);
        assert_eq!(counter.most_common(1), vec![("r", 3)]);
    }
}
