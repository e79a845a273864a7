// Rolling window of recent classifications
// Smooths per-sample decisions into a majority over the last N results

use std::collections::VecDeque;

use crate::events::types::{GestureClass, NUM_CLASSES};

pub const DEFAULT_HISTORY_LEN: usize = 25;

#[derive(Debug, Clone)]
pub struct ClassificationHistory {
    window: VecDeque<GestureClass>,
    counts: [usize; NUM_CLASSES],
}

impl ClassificationHistory {
    /// A full window pre-filled with the cold-start class
    pub fn new(len: usize) -> Self {
        let len = len.max(1);
        let mut counts = [0usize; NUM_CLASSES];
        counts[GestureClass::COLD_START.index()] = len;
        ClassificationHistory {
            window: std::iter::repeat(GestureClass::COLD_START).take(len).collect(),
            counts,
        }
    }

    /// Record a result, evicting the oldest one
    pub fn push(&mut self, class: GestureClass) {
        if let Some(oldest) = self.window.pop_front() {
            self.counts[oldest.index()] -= 1;
        }
        self.window.push_back(class);
        self.counts[class.index()] += 1;
    }

    pub fn counts(&self) -> [usize; NUM_CLASSES] {
        self.counts
    }

    /// Most frequent class in the window; the lowest class wins a tie
    pub fn most_common(&self) -> GestureClass {
        let mut best = GestureClass::COLD_START;
        for class in GestureClass::all() {
            if self.counts[class.index()] > self.counts[best.index()] {
                best = class;
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &GestureClass> {
        self.window.iter()
    }
}

impl Default for ClassificationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}
