//! Cursor trail for forward-only keyset pagination.
//!
//! Solr only hands out forward cursors. To page backwards the client keeps
//! every cursor mark it has been given, in discovery order, and replays them.
//! Index 0 is always the start cursor `*`; index `n` is the cursor for page `n + 1`.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Result, SearchError};
use crate::query::START_CURSOR;

/// Outcome of observing a cursor mark from a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenObservation {
    /// New cursor, appended to the trail.
    Appended,
    /// Already in the trail; nothing changed.
    AlreadySeen,
    /// Same as the cursor of the current page: the server has no more results.
    EndOfResults,
}

/// Ordered, deduplicated cursor marks plus the displayed position.
#[derive(Debug, Clone)]
pub struct CursorCache {
    tokens: Vec<String>,
    seen: HashSet<String>,
    position: usize,
    /// Page whose response echoed its own cursor mark.
    end_of_results: Option<usize>,
}

impl Default for CursorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorCache {
    pub fn new() -> Self {
        let mut cache = Self {
            tokens: Vec::new(),
            seen: HashSet::new(),
            position: 0,
            end_of_results: None,
        };
        cache.reset();
        cache
    }

    /// Forget the trail and start over at the start cursor.
    pub fn reset(&mut self) {
        self.tokens.clear();
        self.seen.clear();
        self.tokens.push(START_CURSOR.to_string());
        self.seen.insert(START_CURSOR.to_string());
        self.position = 0;
        self.end_of_results = None;
    }

    /// Observe the next cursor mark returned for the current page.
    ///
    /// Idempotent: the same token delivered twice never produces two entries.
    pub fn record_token(&mut self, token: &str) -> TokenObservation {
        if self.tokens[self.position] == token {
            debug!(position = self.position, "Cursor repeated, end of results");
            self.end_of_results = Some(self.position);
            return TokenObservation::EndOfResults;
        }

        // The last page now leads somewhere, e.g. a refresh after reindexing.
        if self.end_of_results == Some(self.position) {
            debug!(position = self.position, "Cursor advanced past previous end of results");
            self.end_of_results = None;
        }

        if self.seen.contains(token) {
            return TokenObservation::AlreadySeen;
        }

        self.seen.insert(token.to_string());
        self.tokens.push(token.to_string());
        debug!(pages = self.tokens.len(), "Recorded new cursor mark");
        TokenObservation::Appended
    }

    /// Advance to the next known cursor.
    pub fn next(&mut self) -> Result<&str> {
        if !self.has_next() {
            return Err(SearchError::NoNextPage);
        }
        self.position += 1;
        Ok(&self.tokens[self.position])
    }

    /// Step back to the previous cursor.
    pub fn prev(&mut self) -> Result<&str> {
        if !self.has_previous() {
            return Err(SearchError::NoPreviousPage);
        }
        self.position -= 1;
        Ok(&self.tokens[self.position])
    }

    pub fn has_next(&self) -> bool {
        self.position + 1 < self.tokens.len() && self.end_of_results != Some(self.position)
    }

    pub fn has_previous(&self) -> bool {
        self.position > 0
    }

    /// Cursor mark of the page currently displayed.
    pub fn current(&self) -> &str {
        &self.tokens[self.position]
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false: the start cursor is never removed.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Move back to a position that was valid earlier, e.g. after a failed fetch.
    /// Out-of-range positions are clamped to the last known cursor.
    pub fn rewind_to(&mut self, position: usize) {
        self.position = position.min(self.tokens.len() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cache_with(tokens: &[&str]) -> CursorCache {
        let mut cache = CursorCache::new();
        for token in tokens {
            cache.record_token(token);
            let _ = cache.next();
        }
        cache.rewind_to(0);
        cache
    }

    #[test]
    fn test_reset_state() {
        let mut cache = cache_with(&["A", "B"]);
        cache.rewind_to(2);
        cache.reset();
        assert_eq!(cache.tokens(), ["*"]);
        assert_eq!(cache.position(), 0);
        assert!(!cache.has_next());
        assert!(!cache.has_previous());
    }

    #[test]
    fn test_record_is_idempotent() {
        let mut cache = CursorCache::new();
        assert_eq!(cache.record_token("AOE3"), TokenObservation::Appended);
        assert_eq!(cache.record_token("AOE3"), TokenObservation::AlreadySeen);
        assert_eq!(cache.record_token("AOE3"), TokenObservation::AlreadySeen);
        assert_eq!(cache.tokens(), ["*", "AOE3"]);
    }

    #[test]
    fn test_no_duplicates_for_any_sequence() {
        let mut cache = CursorCache::new();
        let feed = ["A", "B", "A", "*", "C", "B", "C", "D", "A"];
        for (i, token) in feed.iter().enumerate() {
            cache.record_token(token);
            if i % 2 == 0 {
                let _ = cache.next();
            } else {
                let _ = cache.prev();
            }
        }
        let mut sorted: Vec<&String> = cache.tokens().iter().collect();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), cache.len());
    }

    #[test]
    fn test_next_prev_round_trip() {
        let mut cache = CursorCache::new();
        cache.record_token("AOE3");
        assert_eq!(cache.next().unwrap(), "AOE3");
        assert_eq!(cache.position(), 1);
        assert_eq!(cache.prev().unwrap(), "*");
        assert_eq!(cache.position(), 0);
        assert_eq!(cache.current(), "*");
    }

    #[test]
    fn test_next_without_recorded_token() {
        let mut cache = CursorCache::new();
        assert!(matches!(cache.next(), Err(SearchError::NoNextPage)));
        assert_eq!(cache.position(), 0);
    }

    #[test]
    fn test_prev_at_start() {
        let mut cache = CursorCache::new();
        assert!(matches!(cache.prev(), Err(SearchError::NoPreviousPage)));
        assert_eq!(cache.position(), 0);
    }

    #[test]
    fn test_repeated_cursor_ends_pagination() {
        let mut cache = CursorCache::new();
        cache.record_token("A");
        cache.next().unwrap();
        cache.record_token("B");
        cache.next().unwrap();

        // Last page: Solr echoes the cursor it was given.
        assert_eq!(cache.record_token("B"), TokenObservation::EndOfResults);
        assert_eq!(cache.tokens(), ["*", "A", "B"]);
        assert!(matches!(cache.next(), Err(SearchError::NoNextPage)));

        // Earlier pages still lead forward.
        cache.prev().unwrap();
        assert!(cache.has_next());
        assert_eq!(cache.next().unwrap(), "B");
    }

    #[test]
    fn test_single_page_result() {
        let mut cache = CursorCache::new();
        assert_eq!(cache.record_token("*"), TokenObservation::EndOfResults);
        assert!(matches!(cache.next(), Err(SearchError::NoNextPage)));
    }

    #[test]
    fn test_new_cursor_after_end_of_results() {
        let mut cache = CursorCache::new();
        assert_eq!(cache.record_token("*"), TokenObservation::EndOfResults);
        assert!(!cache.has_next());

        // Same page refreshed after new documents were indexed.
        assert_eq!(cache.record_token("A"), TokenObservation::Appended);
        assert!(cache.has_next());
        assert_eq!(cache.next().unwrap(), "A");
    }

    #[test]
    fn test_revisit_does_not_grow_trail() {
        let mut cache = cache_with(&["A", "B"]);
        assert_eq!(cache.record_token("A"), TokenObservation::AlreadySeen);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_rewind_clamps() {
        let mut cache = cache_with(&["A"]);
        cache.rewind_to(7);
        assert_eq!(cache.position(), 1);
        assert_eq!(cache.current(), "A");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Record(String),
        Next,
        Prev,
        Reset,
    }

    fn arb_token() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(START_CURSOR.to_string()),
            Just("A".to_string()),
            Just("B".to_string()),
            Just("C".to_string()),
            Just("D".to_string()),
        ]
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => arb_token().prop_map(Op::Record),
            3 => Just(Op::Next),
            2 => Just(Op::Prev),
            1 => Just(Op::Reset),
        ]
    }

    proptest! {
        /// The trail stays deduplicated and anchored at the start cursor.
        #[test]
        fn trail_is_deduplicated(ops in prop::collection::vec(arb_op(), 0..64)) {
            let mut cache = CursorCache::new();
            for op in ops {
                let before = cache.len();
                match op {
                    Op::Record(token) => {
                        cache.record_token(&token);
                        prop_assert!(cache.tokens().contains(&token));
                        prop_assert!(cache.len() <= before + 1);
                    }
                    Op::Next => { let _ = cache.next(); }
                    Op::Prev => { let _ = cache.prev(); }
                    Op::Reset => cache.reset(),
                }

                let mut sorted = cache.tokens().to_vec();
                sorted.sort();
                sorted.dedup();
                prop_assert_eq!(sorted.len(), cache.len());
                prop_assert_eq!(cache.tokens()[0].as_str(), START_CURSOR);
                prop_assert!(cache.position() < cache.len());
            }
        }

        /// next and prev fail exactly at the boundaries, and a successful
        /// next followed by prev lands back on the same cursor.
        #[test]
        fn navigation_boundaries(ops in prop::collection::vec(arb_op(), 0..64)) {
            let mut cache = CursorCache::new();
            // Page whose response last echoed its own cursor.
            let mut echoed: Option<usize> = None;

            for op in ops {
                let position = cache.position();
                match op {
                    Op::Record(token) => {
                        if cache.current() == token {
                            echoed = Some(position);
                        } else if echoed == Some(position) {
                            echoed = None;
                        }
                        cache.record_token(&token);
                    }
                    Op::Next => {
                        let expect_ok = position + 1 < cache.len() && echoed != Some(position);
                        let current = cache.current().to_string();
                        match cache.next().map(|_| ()) {
                            Ok(()) => {
                                prop_assert!(expect_ok);
                                prop_assert_eq!(cache.position(), position + 1);
                                prop_assert!(cache.prev().is_ok());
                                prop_assert_eq!(cache.current(), current.as_str());
                                cache.next().unwrap();
                            }
                            Err(e) => {
                                prop_assert!(!expect_ok);
                                prop_assert!(matches!(e, SearchError::NoNextPage));
                                prop_assert_eq!(cache.position(), position);
                            }
                        }
                    }
                    Op::Prev => match cache.prev().map(|_| ()) {
                        Ok(()) => {
                            prop_assert_eq!(cache.position() + 1, position);
                        }
                        Err(e) => {
                            prop_assert_eq!(position, 0);
                            prop_assert!(matches!(e, SearchError::NoPreviousPage));
                        }
                    },
                    Op::Reset => {
                        cache.reset();
                        echoed = None;
                    }
                }
            }
        }
    }
}
