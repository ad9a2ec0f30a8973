use chrono::{DateTime, Local};

use crate::constants::{DEFAULT_MAX_HISTORY_TURNS, DEFAULT_RETAINED_TURNS};
use crate::models::Turn;

/// Growth bounds for a single history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    /// Upper bound on the turn count, system preamble included
    pub max_turns: usize,
    /// Turns kept after the preamble when the bound would be exceeded
    pub retained_turns: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_HISTORY_TURNS,
            retained_turns: DEFAULT_RETAINED_TURNS,
        }
    }
}

impl From<&crate::app::HistoryConfig> for HistoryLimits {
    fn from(config: &crate::app::HistoryConfig) -> Self {
        Self {
            max_turns: config.max_turns,
            retained_turns: config.retained_turns,
        }
    }
}

/// The ordered turn sequence of one session
///
/// Index 0 is always the system preamble. It is set at construction and no
/// operation on this type can remove or replace it.
#[derive(Debug, Clone)]
pub struct History {
    turns: Vec<Turn>,
    created_at: DateTime<Local>,
    updated_at: DateTime<Local>,
}

impl History {
    /// Create a history seeded with the system preamble
    pub fn new(preamble: &str) -> Self {
        let now = Local::now();
        Self {
            turns: vec![Turn::system(preamble)],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always false: the preamble is never evicted
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Local> {
        self.updated_at
    }

    /// Mark the history as accessed now
    pub fn touch(&mut self) {
        self.updated_at = Local::now();
    }

    /// Append a turn, compacting first if it would not fit
    ///
    /// When adding `turn` would push the count past `limits.max_turns`, the
    /// sequence is cut down to the preamble plus the last
    /// `limits.retained_turns` turns before `turn` is pushed. Returns the
    /// number of turns dropped.
    pub fn push(&mut self, turn: Turn, limits: HistoryLimits) -> usize {
        let mut evicted = 0;
        if self.turns.len() + 1 > limits.max_turns {
            let keep_from = self
                .turns
                .len()
                .saturating_sub(limits.retained_turns)
                .max(1);
            evicted = keep_from - 1;
            self.turns.drain(1..keep_from);
        }

        self.turns.push(turn);
        self.touch();
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user_turns(n: usize) -> Vec<Turn> {
        (0..n).map(|i| Turn::user(format!("message {i}"))).collect()
    }

    #[test]
    fn test_new_history_holds_only_preamble() {
        let history = History::new("rules");
        assert_eq!(history.turns(), &[Turn::system("rules")]);
        assert!(!history.is_empty());
    }

    #[test]
    fn test_push_below_limit_keeps_everything() {
        let mut history = History::new("rules");
        for turn in user_turns(19) {
            assert_eq!(history.push(turn, HistoryLimits::default()), 0);
        }
        assert_eq!(history.len(), 20);
    }

    #[test]
    fn test_push_past_limit_keeps_preamble_and_recent_turns() {
        let mut history = History::new("rules");
        let turns = user_turns(30);
        for turn in turns.iter().cloned() {
            history.push(turn, HistoryLimits::default());
        }

        assert_eq!(history.len(), 20);
        assert_eq!(history.turns()[0], Turn::system("rules"));
        // The 19 most recent turns, in their original order
        assert_eq!(&history.turns()[1..], &turns[11..]);
    }

    #[test]
    fn test_compaction_reports_dropped_turns() {
        let mut history = History::new("rules");
        for turn in user_turns(19) {
            history.push(turn, HistoryLimits::default());
        }
        // 20 turns stored; the next push compacts to preamble + 18 first
        let evicted = history.push(Turn::assistant("reply"), HistoryLimits::default());
        assert_eq!(evicted, 1);
        assert_eq!(history.len(), 20);
        assert_eq!(history.turns()[19], Turn::assistant("reply"));
    }

    #[test]
    fn test_custom_limits() {
        let limits = HistoryLimits {
            max_turns: 5,
            retained_turns: 2,
        };
        let mut history = History::new("rules");
        let turns = user_turns(6);
        for turn in turns.iter().cloned() {
            history.push(turn, limits);
        }
        // After the 5th push: [sys, m0..m3] -> [sys, m2, m3, m4]; then m5 -> 5 turns
        assert_eq!(
            history.turns(),
            &[
                Turn::system("rules"),
                turns[2].clone(),
                turns[3].clone(),
                turns[4].clone(),
                turns[5].clone(),
            ]
        );
    }
}
