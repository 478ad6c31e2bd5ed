//! Bounded FIFO window of chat entries with an incremental vocabulary index.
//!
//! # Index invariant
//!
//! Summed across authors, a word's indexed count always equals the number of
//! window-resident tokens of that word. Insertion increments by the entry's
//! per-message counts, eviction decrements by the same amounts, and an
//! author's entry disappears the moment its word map empties. The index is
//! never recomputed from the entries except on [`Window::clear`].

use std::collections::{HashMap, VecDeque};

/// One accepted chat line while it lives inside the window.
#[derive(Debug, Clone)]
pub struct ChatEntry {
    /// Sender nickname.
    pub author: String,
    /// Whitespace-split tokens of the message, in order.
    pub words: Vec<String>,
    /// Word → occurrence count within this single message.
    pub word_counts: HashMap<String, u32>,
}

impl ChatEntry {
    /// Tokenize `text` on whitespace (empty tokens excluded) into an entry.
    pub fn new(author: &str, text: &str) -> Self {
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let mut word_counts = HashMap::new();
        for word in &words {
            *word_counts.entry(word.clone()).or_insert(0) += 1;
        }
        Self {
            author: author.to_string(),
            words,
            word_counts,
        }
    }
}

/// Bounded FIFO of [`ChatEntry`] plus the derived author vocabulary index.
#[derive(Debug)]
pub struct Window {
    entries: VecDeque<ChatEntry>,
    capacity: usize,
    /// Author → (word → count), maintained incrementally.
    index: HashMap<String, HashMap<String, u32>>,
}

impl Window {
    /// Create an empty window. `capacity` must be at least 1 (validated by
    /// the tracker before construction).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            index: HashMap::new(),
        }
    }

    /// Insert an entry, evicting the oldest one first when at capacity.
    pub fn push(&mut self, entry: ChatEntry) {
        if self.entries.len() == self.capacity {
            self.evict_oldest();
        }

        if !entry.word_counts.is_empty() {
            let vocabulary = self.index.entry(entry.author.clone()).or_default();
            for (word, count) in &entry.word_counts {
                *vocabulary.entry(word.clone()).or_insert(0) += count;
            }
        }

        self.entries.push_back(entry);
    }

    fn evict_oldest(&mut self) {
        let Some(entry) = self.entries.pop_front() else {
            return;
        };

        if let Some(vocabulary) = self.index.get_mut(&entry.author) {
            for (word, count) in &entry.word_counts {
                if let Some(indexed) = vocabulary.get_mut(word) {
                    *indexed = indexed.saturating_sub(*count);
                    if *indexed == 0 {
                        vocabulary.remove(word);
                    }
                }
            }
            if vocabulary.is_empty() {
                self.index.remove(&entry.author);
            }
        }
    }

    /// Drop all entries and reset the index.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Number of entries currently resident.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the window holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries in FIFO order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ChatEntry> {
        self.entries.iter()
    }

    /// Number of distinct authors with window-resident vocabulary.
    pub fn author_count(&self) -> usize {
        self.index.len()
    }

    /// The author → word → count index.
    pub fn index(&self) -> &HashMap<String, HashMap<String, u32>> {
        &self.index
    }

    /// How many distinct authors have `word` in their window contribution.
    pub fn authors_using(&self, word: &str) -> usize {
        self.index
            .values()
            .filter(|vocabulary| vocabulary.contains_key(word))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn entry_counts_repeats_within_one_message() {
        let entry = ChatEntry::new("a", "KEKW KEKW x");
        assert_eq!(entry.words, vec!["KEKW", "KEKW", "x"]);
        assert_eq!(entry.word_counts["KEKW"], 2);
        assert_eq!(entry.word_counts["x"], 1);
    }

    #[test]
    fn whitespace_only_text_yields_no_tokens() {
        let entry = ChatEntry::new("a", "   ");
        assert!(entry.words.is_empty());

        let mut window = Window::new(3);
        window.push(entry);
        assert_eq!(window.len(), 1);
        // No vocabulary, so the author is not counted as a participant.
        assert_eq!(window.author_count(), 0);
    }

    #[test]
    fn eviction_removes_oldest_contribution_fully() {
        let mut window = Window::new(2);
        window.push(ChatEntry::new("a", "first"));
        window.push(ChatEntry::new("b", "second"));
        window.push(ChatEntry::new("c", "third"));

        assert_eq!(window.len(), 2);
        assert_eq!(window.author_count(), 2);
        assert!(!window.index().contains_key("a"));
        assert_eq!(window.authors_using("first"), 0);
        assert_eq!(window.authors_using("second"), 1);
    }

    #[test]
    fn same_author_across_messages_accumulates_and_drains() {
        let mut window = Window::new(2);
        window.push(ChatEntry::new("a", "KEKW"));
        window.push(ChatEntry::new("a", "KEKW KEKW"));
        assert_eq!(window.index()["a"]["KEKW"], 3);

        // Evicts the first message, leaving the second's two tokens.
        window.push(ChatEntry::new("a", "other"));
        assert_eq!(window.index()["a"]["KEKW"], 2);
        assert_eq!(window.index()["a"]["other"], 1);
    }

    /// Total per-word counts across all window-resident entries.
    fn totals_from_entries(window: &Window) -> HashMap<String, u32> {
        let mut totals: HashMap<String, u32> = HashMap::new();
        for entry in window.iter() {
            for (word, count) in &entry.word_counts {
                *totals.entry(word.clone()).or_insert(0) += count;
            }
        }
        totals
    }

    fn totals_from_index(window: &Window) -> HashMap<String, u32> {
        let mut totals: HashMap<String, u32> = HashMap::new();
        for vocabulary in window.index().values() {
            for (word, count) in vocabulary {
                *totals.entry(word.clone()).or_insert(0) += count;
            }
        }
        totals
    }

    proptest! {
        /// For any add sequence, the window never exceeds its capacity and
        /// the index stays consistent with the resident entries.
        #[test]
        fn index_matches_window_contents(
            capacity in 1usize..6,
            messages in prop::collection::vec(
                (0u8..5, prop::collection::vec("[a-c]{1,2}", 0..4)),
                0..40,
            ),
        ) {
            let mut window = Window::new(capacity);
            for (author, words) in messages {
                window.push(ChatEntry::new(
                    &format!("user{author}"),
                    &words.join(" "),
                ));
                prop_assert!(window.len() <= capacity);
                prop_assert_eq!(totals_from_index(&window), totals_from_entries(&window));
            }
        }
    }
}
