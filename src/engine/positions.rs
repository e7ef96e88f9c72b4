//! Per-session position table.
//!
//! ## Invariants
//!
//! - Each (field, kind) pair has its own counter; the first call for a pair
//!   returns the configured start value.
//! - Counters only move forward by one per call. There is no reset: a loader
//!   gets a fresh table when it is created and drops it with the session.
//! - Counters saturate at `usize::MAX` instead of wrapping.

use crate::SelectorKind;
use std::collections::HashMap;

/// Hands out 1-based (by default) rule positions for one extraction session.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    start: usize,
    next: HashMap<SelectorKind, HashMap<String, usize>>,
}

impl PositionTracker {
    pub fn new(start: usize) -> Self {
        Self { start, next: HashMap::new() }
    }

    /// Return the position for the next rule evaluated on `field` with `kind`.
    pub fn next_position(&mut self, field: &str, kind: SelectorKind) -> usize {
        let by_field = self.next.entry(kind).or_default();

        // Lookup by `&str` first so the steady state does not allocate.
        if let Some(slot) = by_field.get_mut(field) {
            let position = *slot;
            *slot = slot.saturating_add(1);
            return position;
        }

        by_field.insert(field.to_string(), self.start.saturating_add(1));
        self.start
    }

    /// Position the next call for this pair would return, without consuming it.
    pub fn peek(&self, field: &str, kind: SelectorKind) -> usize {
        self.next.get(&kind).and_then(|by_field| by_field.get(field)).copied().unwrap_or(self.start)
    }

    pub fn start(&self) -> usize {
        self.start
    }
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new(crate::Options::default().start_position)
    }
}
