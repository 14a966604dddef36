//! Bounded undo history of mask snapshots.
//!
//! Each entry is a full-resolution copy of the mask, so the history is
//! capped: once `max_history` entries are stored, pushing a new one evicts
//! the oldest.

use std::collections::VecDeque;

use crate::constants::DEFAULT_MAX_HISTORY_SIZE;
use crate::mask::Mask;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the mask history
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Maximum number of snapshots to keep
    pub max_history: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY_SIZE,
        }
    }
}

// ============================================================================
// Mask History
// ============================================================================

/// Result of an undo request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The mask was restored to the most recent checkpoint
    Reverted,
    /// History was empty; the mask is unchanged
    NothingToUndo,
    /// A stroke is being drawn; undo is ignored until it ends
    StrokeInProgress,
}

/// FIFO-bounded stack of mask snapshots (most recent at the back).
#[derive(Debug, Clone, Default)]
pub struct MaskHistory {
    entries: VecDeque<Mask>,
    config: HistoryConfig,
}

impl MaskHistory {
    /// Create an empty history with the default capacity
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.max_history.min(64)),
            config,
        }
    }

    /// Store a deep copy of `mask` as the newest checkpoint.
    pub fn checkpoint(&mut self, mask: &Mask) {
        while self.entries.len() >= self.config.max_history.max(1) {
            self.entries.pop_front();
            log::debug!(
                "History: evicted oldest checkpoint (capacity {})",
                self.config.max_history
            );
        }
        self.entries.push_back(mask.clone());
        log::debug!(
            "History: checkpoint stored ({}/{})",
            self.entries.len(),
            self.config.max_history
        );
    }

    /// Remove and return the newest checkpoint, or `None` when empty.
    pub fn undo(&mut self) -> Option<Mask> {
        let entry = self.entries.pop_back();
        if entry.is_some() {
            log::debug!("History: popped checkpoint ({} left)", self.entries.len());
        }
        entry
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.max_history
    }
}

// ============================================================================
// Tests
// ============================================================================
