//! The convergence tracker and its derived state.
//!
//! # Ranking determinism
//!
//! Words are ranked by distinct-author count. Ties are broken by first-seen
//! order during a FIFO walk of the window, never by hash-map iteration
//! order, so identical inputs always produce identical dominant phrases.

use std::collections::{HashMap, HashSet};

use crate::error::{ConvergeError, Result};
use crate::window::{ChatEntry, Window};

/// Default alert threshold: percentage of participants on the dominant word.
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 75.0;

/// Default minimum distinct-author count for the dominant word.
pub const DEFAULT_MIN_REPEAT_COUNT: usize = 3;

/// Default phrase-widening author-count threshold, percent of the dominant's.
pub const DEFAULT_SAME_WORD_THRESHOLD: f64 = 80.0;

/// Default phrase-widening repeat-count threshold, percent of the dominant's.
pub const DEFAULT_SAME_FREQ_THRESHOLD: f64 = 80.0;

/// Derived convergence state, recomputed after every window mutation.
///
/// Always a pure function of the window contents plus the configured
/// thresholds; [`Default`] is the zero state an empty window produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvergenceState {
    /// The leading word, possibly widened with near-tied words.
    pub dominant_phrase: String,
    /// How many distinct authors used the leading word.
    pub dominant_occurrence_count: usize,
    /// Mode of per-message repeat counts of the leading word across authors,
    /// ties resolved toward the larger repeat value.
    pub modal_repeat_count: u32,
    /// `100 · dominant_occurrence_count / unique_author_count`.
    pub convergence_score: f64,
    /// Distinct authors with window-resident vocabulary.
    pub unique_author_count: usize,
    /// Both thresholds reached (inclusive boundaries).
    pub alert: bool,
}

impl ConvergenceState {
    /// Render the phrase as the echo utterance the bot would send: the
    /// dominant phrase repeated `modal_repeat_count` times, space-joined.
    pub fn reply_text(&self) -> String {
        let repeats = self.modal_repeat_count.max(1) as usize;
        vec![self.dominant_phrase.as_str(); repeats].join(" ")
    }
}

/// Sliding-window analytics engine detecting herd convergence.
#[derive(Debug)]
pub struct ConvergenceTracker {
    window: Window,
    threshold_percent: f64,
    min_repeat_count: usize,
    same_word_threshold: f64,
    same_freq_threshold: f64,
    state: ConvergenceState,
}

impl ConvergenceTracker {
    /// Create a tracker over a window of `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < 1 {
            return Err(ConvergeError::InvalidCapacity { given: capacity });
        }
        Ok(Self {
            window: Window::new(capacity),
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
            min_repeat_count: DEFAULT_MIN_REPEAT_COUNT,
            same_word_threshold: DEFAULT_SAME_WORD_THRESHOLD,
            same_freq_threshold: DEFAULT_SAME_FREQ_THRESHOLD,
            state: ConvergenceState::default(),
        })
    }

    /// Ingest one chat message and return the new alert value.
    pub fn add(&mut self, author: &str, text: &str) -> bool {
        self.window.push(ChatEntry::new(author, text));
        self.state = self.recompute();
        self.state.alert
    }

    /// Current derived state.
    pub fn state(&self) -> &ConvergenceState {
        &self.state
    }

    /// Resident entry count (for the operator console).
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Configured window capacity.
    pub fn window_capacity(&self) -> usize {
        self.window.capacity()
    }

    /// Configured alert threshold percent.
    pub fn threshold_percent(&self) -> f64 {
        self.threshold_percent
    }

    /// Configured minimum distinct-author count.
    pub fn min_repeat_count(&self) -> usize {
        self.min_repeat_count
    }

    /// Empty the window and reset all derived fields. Idempotent.
    pub fn clear(&mut self) {
        self.window.clear();
        self.state = ConvergenceState::default();
    }

    /// Apply a new window capacity. Destructive by design: the window is
    /// cleared rather than re-bucketed.
    pub fn set_window_capacity(&mut self, capacity: usize) -> Result<()> {
        if capacity < 1 {
            return Err(ConvergeError::InvalidCapacity { given: capacity });
        }
        self.window = Window::new(capacity);
        self.state = ConvergenceState::default();
        Ok(())
    }

    /// Set the alert threshold percent. Takes effect on the next `add`.
    pub fn set_threshold(&mut self, percent: f64) -> Result<()> {
        if !percent.is_finite() || percent <= 0.0 {
            return Err(ConvergeError::InvalidThreshold { given: percent });
        }
        self.threshold_percent = percent;
        Ok(())
    }

    /// Set the minimum distinct-author count. Takes effect on the next `add`.
    pub fn set_min_repeat_count(&mut self, count: usize) {
        self.min_repeat_count = count;
    }

    /// Set the phrase-widening author-count threshold percent.
    pub fn set_same_word_threshold(&mut self, percent: f64) {
        self.same_word_threshold = percent;
    }

    /// Set the phrase-widening repeat-count threshold percent.
    pub fn set_same_freq_threshold(&mut self, percent: f64) {
        self.same_freq_threshold = percent;
    }

    fn recompute(&self) -> ConvergenceState {
        let unique_author_count = self.window.author_count();
        if unique_author_count == 0 {
            return ConvergenceState::default();
        }

        // Words in first-seen order, walking the window oldest to newest.
        let mut order: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for entry in self.window.iter() {
            for word in &entry.words {
                if seen.insert(word.as_str()) {
                    order.push(word.as_str());
                }
            }
        }

        // Rank by distinct-author count, descending. The sort is stable, so
        // ties keep discovery order.
        let mut ranked: Vec<(&str, usize)> = order
            .iter()
            .map(|&word| (word, self.window.authors_using(word)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let Some(&(dominant, dominant_occurrence_count)) = ranked.first() else {
            return ConvergenceState::default();
        };
        let modal_repeat_count = self.modal_repeat(dominant);

        // Widen the phrase with near-tied words: author count within
        // same_word_threshold percent of the dominant's AND modal repeat
        // within same_freq_threshold percent of the dominant's.
        let mut dominant_phrase = dominant.to_string();
        for &(word, authors) in &ranked[1..] {
            let author_pct = 100.0 * authors as f64 / dominant_occurrence_count as f64;
            if author_pct < self.same_word_threshold {
                // Ranked descending, so every later word is below too.
                break;
            }
            let repeat_pct =
                100.0 * self.modal_repeat(word) as f64 / modal_repeat_count.max(1) as f64;
            if repeat_pct >= self.same_freq_threshold {
                dominant_phrase.push(' ');
                dominant_phrase.push_str(word);
            }
        }

        let convergence_score =
            100.0 * dominant_occurrence_count as f64 / unique_author_count.max(1) as f64;
        let alert = self.threshold_percent <= convergence_score
            && self.min_repeat_count <= dominant_occurrence_count;

        ConvergenceState {
            dominant_phrase,
            dominant_occurrence_count,
            modal_repeat_count,
            convergence_score,
            unique_author_count,
            alert,
        }
    }

    /// Mode of `word`'s per-message repeat counts across the messages that
    /// contain it. When several repeat values are equally frequent, the
    /// largest wins, biasing toward a stronger single-message signal.
    fn modal_repeat(&self, word: &str) -> u32 {
        let mut frequency: HashMap<u32, usize> = HashMap::new();
        for entry in self.window.iter() {
            if let Some(&count) = entry.word_counts.get(word) {
                *frequency.entry(count).or_insert(0) += 1;
            }
        }
        frequency
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(value, _)| value)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(capacity: usize, threshold: f64, min_repeat: usize) -> ConvergenceTracker {
        let mut tracker = ConvergenceTracker::new(capacity).unwrap();
        tracker.set_threshold(threshold).unwrap();
        tracker.set_min_repeat_count(min_repeat);
        tracker
    }

    #[test]
    fn worked_convergence_example() {
        let mut t = tracker(5, 75.0, 2);
        assert!(!t.add("a", "KEKW KEKW"));
        assert!(!t.add("b", "KEKW KEKW"));
        assert!(t.add("c", "KEKW"));
        // A fourth participant off-topic dilutes the score to exactly 75.
        assert!(t.add("d", "TEST"));

        let state = t.state();
        assert_eq!(state.unique_author_count, 4);
        assert_eq!(state.dominant_phrase, "KEKW");
        assert_eq!(state.dominant_occurrence_count, 3);
        assert_eq!(state.convergence_score, 75.0);
        assert!(state.alert);
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        // 3 of 4 authors → exactly 75.0.
        let mut t = tracker(5, 75.0, 2);
        t.add("a", "KEKW");
        t.add("b", "KEKW");
        t.add("c", "KEKW");
        assert!(t.add("d", "TEST"));
        assert_eq!(t.state().convergence_score, 75.0);

        // One unit above the score must not alert.
        let mut t = tracker(5, 76.0, 2);
        t.add("a", "KEKW");
        t.add("b", "KEKW");
        t.add("c", "KEKW");
        assert!(!t.add("d", "TEST"));
    }

    #[test]
    fn min_repeat_count_gates_the_alert() {
        let mut t = tracker(5, 50.0, 4);
        t.add("a", "KEKW");
        t.add("b", "KEKW");
        assert!(!t.add("c", "KEKW"));
        assert!(t.add("d", "KEKW"));
    }

    #[test]
    fn eviction_drops_first_author_from_scoring() {
        let mut t = tracker(3, 75.0, 2);
        t.add("a", "alpha");
        t.add("b", "beta");
        t.add("c", "gamma");
        t.add("d", "delta");

        let state = t.state();
        assert_eq!(state.unique_author_count, 3);
        assert_ne!(state.dominant_phrase, "alpha");
    }

    #[test]
    fn modal_repeat_picks_most_common_per_message_count() {
        let mut t = tracker(5, 1.0, 1);
        t.add("a", "KEKW KEKW");
        t.add("b", "KEKW KEKW");
        t.add("c", "KEKW");

        let state = t.state();
        // Two messages repeated it twice, one once: mode is 2.
        assert_eq!(state.modal_repeat_count, 2);
        assert_eq!(state.reply_text(), "KEKW KEKW");
    }

    #[test]
    fn modal_repeat_ties_favor_larger_value() {
        let mut t = tracker(5, 1.0, 1);
        t.add("a", "KEKW");
        t.add("b", "KEKW KEKW KEKW");

        // One message with count 1, one with count 3: the tie goes to 3.
        assert_eq!(t.state().modal_repeat_count, 3);
    }

    #[test]
    fn phrase_widens_with_near_tied_words() {
        let mut t = tracker(6, 1.0, 1);
        t.add("a", "KEKW LUL");
        t.add("b", "KEKW LUL");
        t.add("c", "KEKW LUL");

        // LUL matches KEKW's author count and repeat profile exactly.
        assert_eq!(t.state().dominant_phrase, "KEKW LUL");
    }

    #[test]
    fn phrase_does_not_widen_below_author_threshold() {
        let mut t = tracker(6, 1.0, 1);
        t.add("a", "KEKW LUL");
        t.add("b", "KEKW");
        t.add("c", "KEKW");

        // LUL has 1 of 3 authors, far under the widening threshold.
        assert_eq!(t.state().dominant_phrase, "KEKW");
    }

    #[test]
    fn tie_between_words_breaks_by_discovery_order() {
        let mut t = tracker(6, 1.0, 1);
        t.add("a", "zzz aaa");
        t.add("b", "zzz aaa");

        // Both words have 2 authors; zzz was discovered first.
        assert!(t.state().dominant_phrase.starts_with("zzz"));
    }

    #[test]
    fn empty_window_scores_zero() {
        let t = ConvergenceTracker::new(5).unwrap();
        let state = t.state();
        assert_eq!(state.convergence_score, 0.0);
        assert_eq!(state.unique_author_count, 0);
        assert!(!state.alert);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut t = tracker(5, 50.0, 1);
        t.add("a", "KEKW");
        assert!(t.state().alert);

        t.clear();
        t.clear();
        let state = t.state();
        assert_eq!(state.convergence_score, 0.0);
        assert_eq!(state.unique_author_count, 0);
        assert!(!state.alert);
    }

    #[test]
    fn reconfiguring_capacity_clears_state() {
        let mut t = tracker(5, 50.0, 1);
        t.add("a", "KEKW");
        t.set_window_capacity(10).unwrap();
        assert_eq!(t.window_len(), 0);
        assert!(!t.state().alert);

        assert_eq!(
            t.set_window_capacity(0),
            Err(ConvergeError::InvalidCapacity { given: 0 })
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(ConvergenceTracker::new(0).is_err());

        let mut t = ConvergenceTracker::new(5).unwrap();
        assert!(t.set_threshold(0.0).is_err());
        assert!(t.set_threshold(-3.0).is_err());
        assert!(t.set_threshold(f64::NAN).is_err());
        assert!(t.set_threshold(100.0).is_ok());
    }
}
