//! Per-ante reroll usage counters.
//!
//! Counters for different antes are independent; there is no carryover or
//! decay. State lives as long as the owning validator and is never persisted.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    /// Ante numbers start at 1. The message text is part of the observable
    /// contract.
    #[error("Invalid ante number")]
    InvalidAnte,
}

#[derive(Debug, Default)]
pub struct RerollTracker {
    counts: HashMap<u32, u32>,
}

impl RerollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reroll for `ante`, returning the new count. An ante of zero
    /// or below is rejected and leaves every counter untouched.
    pub fn increment(&mut self, ante: i64) -> Result<u32, TrackerError> {
        let ante = u32::try_from(ante).ok().filter(|a| *a > 0).ok_or(TrackerError::InvalidAnte)?;
        let slot = self.counts.entry(ante).or_insert(0);
        *slot = slot.saturating_add(1);
        Ok(*slot)
    }

    /// Usage count for `ante`; zero for any ante never incremented, including
    /// invalid ones. Never errors.
    pub fn count(&self, ante: i64) -> u32 {
        u32::try_from(ante)
            .ok()
            .and_then(|a| self.counts.get(&a).copied())
            .unwrap_or(0)
    }

    pub fn is_limit_reached(&self, ante: i64, limit: u32) -> bool {
        self.count(ante) >= limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_per_ante_are_independent() {
        let mut t = RerollTracker::new();
        for _ in 0..3 {
            t.increment(1).unwrap();
        }
        t.increment(2).unwrap();

        assert_eq!(t.count(1), 3);
        assert_eq!(t.count(2), 1);
        assert_eq!(t.count(3), 0);
    }

    #[test]
    fn invalid_ante_is_rejected_without_side_effects() {
        let mut t = RerollTracker::new();
        assert_eq!(t.increment(-1), Err(TrackerError::InvalidAnte));
        assert_eq!(t.increment(0), Err(TrackerError::InvalidAnte));
        assert_eq!(t.increment(-1).unwrap_err().to_string(), "Invalid ante number");
        assert_eq!(t.count(-1), 0);
        assert_eq!(t.count(0), 0);
    }

    #[test]
    fn limit_comparison_is_pure() {
        let mut t = RerollTracker::new();
        t.increment(4).unwrap();
        t.increment(4).unwrap();
        assert!(t.is_limit_reached(4, 2));
        assert!(!t.is_limit_reached(4, 3));
        assert!(t.is_limit_reached(9, 0));
        assert_eq!(t.count(4), 2);
    }
}
