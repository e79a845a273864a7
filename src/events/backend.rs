// Nearest-neighbor backend abstraction
// Indexed k-NN (k-d tree over a subsample) with a brute-force fallback

#[cfg(feature = "kd-tree")]
use crate::events::knn::KnnIndex;
use crate::events::types::{squared_distance, FeatureVector, GestureClass, TrainingSet};

/// Neighborhood size of the indexed model
pub const K: usize = 15;

/// Only every SUBSAMPLE-th training row goes into the index
pub const SUBSAMPLE: usize = 3;

/// Minimum training rows before any learned decision is made
pub const MIN_TRAINING_ROWS: usize = K * SUBSAMPLE;

/// Query strategy used by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexBackend {
    /// k-d tree k-NN vote over the subsampled training set
    KdTree,

    /// Linear scan for the single nearest row of the full training set
    BruteForce,
}

impl IndexBackend {
    /// Whether the k-d tree backend (the `kd-tree` feature) was compiled in
    pub fn is_available() -> bool {
        cfg!(feature = "kd-tree")
    }

    /// Pick the backend, honoring a runtime opt-out
    pub fn select(use_index: bool) -> Self {
        if use_index && Self::is_available() {
            IndexBackend::KdTree
        } else {
            IndexBackend::BruteForce
        }
    }
}

/// The best available query structure for the current training set
#[derive(Debug, Default)]
pub enum NeighborIndex {
    #[cfg(feature = "kd-tree")]
    Indexed(KnnIndex),
    #[default]
    Absent,
}

impl NeighborIndex {
    /// Build the index for a training set, or `Absent` when the backend
    /// is brute force or there are too few rows
    pub fn build(backend: IndexBackend, training: &TrainingSet) -> Self {
        match backend {
            IndexBackend::KdTree if training.len() >= MIN_TRAINING_ROWS => build_indexed(training),
            _ => NeighborIndex::Absent,
        }
    }

    pub fn is_indexed(&self) -> bool {
        !matches!(self, NeighborIndex::Absent)
    }
}

#[cfg(feature = "kd-tree")]
fn build_indexed(training: &TrainingSet) -> NeighborIndex {
    NeighborIndex::Indexed(KnnIndex::fit(training.subsample(SUBSAMPLE), K))
}

#[cfg(not(feature = "kd-tree"))]
fn build_indexed(_training: &TrainingSet) -> NeighborIndex {
    NeighborIndex::Absent
}

/// Label of the closest row, first occurrence on distance ties
pub fn nearest_label(training: &TrainingSet, query: &FeatureVector) -> Option<GestureClass> {
    training
        .rows()
        .iter()
        .enumerate()
        .min_by_key(|&(i, row)| (squared_distance(query, row), i))
        .map(|(i, _)| training.labels()[i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::CHANNELS;

    fn class(i: u8) -> GestureClass {
        GestureClass::new(i).unwrap()
    }

    fn clustered_set(per_class: usize) -> TrainingSet {
        let mut set = TrainingSet::new();
        for c in [1u8, 4] {
            let base = c as u16 * 1000;
            for i in 0..per_class {
                set.push([base + i as u16; CHANNELS], class(c));
            }
        }
        set
    }

    #[test]
    fn test_backend_selection() {
        assert_eq!(IndexBackend::select(false), IndexBackend::BruteForce);
        if IndexBackend::is_available() {
            assert_eq!(IndexBackend::select(true), IndexBackend::KdTree);
        } else {
            assert_eq!(IndexBackend::select(true), IndexBackend::BruteForce);
        }
    }

    #[test]
    fn test_index_absent_below_threshold() {
        let set = clustered_set(22);
        assert_eq!(set.len(), 44);
        assert!(!NeighborIndex::build(IndexBackend::KdTree, &set).is_indexed());
    }

    #[cfg(feature = "kd-tree")]
    #[test]
    fn test_index_built_at_threshold() {
        let mut set = clustered_set(22);
        set.push([0; CHANNELS], class(0));
        assert_eq!(set.len(), MIN_TRAINING_ROWS);

        match NeighborIndex::build(IndexBackend::KdTree, &set) {
            NeighborIndex::Indexed(index) => {
                assert_eq!(index.k(), K);
                assert_eq!(index.len(), 15);
            }
            NeighborIndex::Absent => panic!("expected an index at {} rows", MIN_TRAINING_ROWS),
        }
    }

    #[cfg(not(feature = "kd-tree"))]
    #[test]
    fn test_kd_tree_backend_unavailable() {
        assert!(!IndexBackend::is_available());
        assert!(!NeighborIndex::build(IndexBackend::KdTree, &clustered_set(100)).is_indexed());
    }

    #[test]
    fn test_brute_force_backend_never_indexes() {
        let set = clustered_set(100);
        assert!(!NeighborIndex::build(IndexBackend::BruteForce, &set).is_indexed());
    }

    #[test]
    fn test_nearest_label() {
        let mut set = TrainingSet::new();
        set.push([0; CHANNELS], class(1));
        set.push([100; CHANNELS], class(2));
        assert_eq!(nearest_label(&set, &[1; CHANNELS]), Some(class(1)));
        assert_eq!(nearest_label(&set, &[99; CHANNELS]), Some(class(2)));
    }

    #[test]
    fn test_nearest_label_first_occurrence_on_tie() {
        let mut set = TrainingSet::new();
        set.push([0; CHANNELS], class(6));
        set.push([10; CHANNELS], class(3));
        assert_eq!(nearest_label(&set, &[5; CHANNELS]), Some(class(6)));
    }

    #[test]
    fn test_nearest_label_empty() {
        assert_eq!(nearest_label(&TrainingSet::new(), &[0; CHANNELS]), None);
    }
}
