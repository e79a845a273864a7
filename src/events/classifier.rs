// Incremental gesture classifier
// Keeps the training set in sync with the label store and rebuilds the index on every change

use thiserror::Error;

use crate::events::backend::{nearest_label, IndexBackend, NeighborIndex, MIN_TRAINING_ROWS};
use crate::events::types::{FeatureVector, GestureClass, TrainingSet, NUM_CLASSES};
use crate::state::storage::{LabelStore, StorageError};

/// Errors that can occur during training or classification
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Nearest-neighbor search on an empty training set")]
    EmptyTrainingSet,
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Online k-NN classifier backed by a [`LabelStore`]
///
/// The in-memory training set always mirrors what is on disk: rows are only
/// added after the corresponding append succeeded.
#[derive(Debug)]
pub struct IncrementalClassifier {
    store: LabelStore,
    backend: IndexBackend,
    training: TrainingSet,
    index: NeighborIndex,
}

impl IncrementalClassifier {
    /// Create a classifier over `store` and load everything it holds
    pub fn open(store: LabelStore, backend: IndexBackend) -> ClassifierResult<Self> {
        let mut classifier = IncrementalClassifier {
            store,
            backend,
            training: TrainingSet::new(),
            index: NeighborIndex::Absent,
        };
        classifier.reload_from_store()?;
        Ok(classifier)
    }

    /// Replace the training set and rebuild the index from scratch
    pub fn train(&mut self, training: TrainingSet) {
        let was_indexed = self.index.is_indexed();
        self.index = NeighborIndex::build(self.backend, &training);
        self.training = training;

        match (was_indexed, self.index.is_indexed()) {
            (false, true) => log::info!(
                "Switched to indexed k-NN at {} training rows",
                self.training.len()
            ),
            (true, false) => log::info!("Dropped k-NN index ({} training rows)", self.training.len()),
            _ => log::debug!("Retrained on {} rows", self.training.len()),
        }
    }

    /// Persist one labeled vector, then retrain with it appended in memory.
    /// If the append fails nothing changes.
    pub fn store_and_retrain(&mut self, class: GestureClass, vector: FeatureVector) -> ClassifierResult<()> {
        if let Err(e) = self.store.append(class, &vector) {
            log::error!("Failed to store sample for class {}: {}", class, e);
            return Err(e.into());
        }

        let mut training = std::mem::take(&mut self.training);
        training.push(vector, class);
        self.train(training);
        Ok(())
    }

    /// Rebuild the training set from disk, classes 0 through 9 in order
    pub fn reload_from_store(&mut self) -> ClassifierResult<()> {
        let mut training = TrainingSet::new();
        for class_set in self.store.read_all()? {
            training.extend(class_set);
        }

        log::info!("Loaded {} training rows from {}", training.len(), self.store.dir().display());
        self.train(training);
        Ok(())
    }

    /// Truncate the store and reset to an empty training set.
    ///
    /// If truncation fails partway, memory is rebuilt from whatever the class
    /// files still hold before the error is returned.
    pub fn clear(&mut self) -> ClassifierResult<()> {
        if let Err(e) = self.store.clear() {
            self.resync_readable();
            return Err(e.into());
        }
        self.reload_from_store()
    }

    /// Reload every class that can still be read; unreadable classes count as empty
    fn resync_readable(&mut self) {
        let mut training = TrainingSet::new();
        for class in GestureClass::all() {
            match self.store.read_class(class) {
                Ok(rows) => training.extend(TrainingSet::for_class(class, rows)),
                Err(e) => log::warn!("Dropping class {} from memory: {}", class, e),
            }
        }
        self.train(training);
    }

    /// Label of the single closest training row (brute force, full set)
    pub fn classify_nearest(&self, vector: &FeatureVector) -> ClassifierResult<GestureClass> {
        nearest_label(&self.training, vector).ok_or(ClassifierError::EmptyTrainingSet)
    }

    /// Classify one vector.
    ///
    /// Below [`MIN_TRAINING_ROWS`] rows this always answers class 0: callers
    /// rely on getting a valid class index, so insufficient data is not an error.
    pub fn classify(&self, vector: &FeatureVector) -> GestureClass {
        if self.training.len() < MIN_TRAINING_ROWS {
            return GestureClass::COLD_START;
        }

        let predicted = match &self.index {
            #[cfg(feature = "kd-tree")]
            NeighborIndex::Indexed(index) => index.predict(vector),
            NeighborIndex::Absent => nearest_label(&self.training, vector),
        };
        predicted.unwrap_or(GestureClass::COLD_START)
    }

    pub fn class_counts(&self) -> [usize; NUM_CLASSES] {
        self.training.class_counts()
    }

    pub fn len(&self) -> usize {
        self.training.len()
    }

    pub fn is_empty(&self) -> bool {
        self.training.is_empty()
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_indexed()
    }

    pub fn backend(&self) -> IndexBackend {
        self.backend
    }

    pub fn training_set(&self) -> &TrainingSet {
        &self.training
    }

    pub fn store(&self) -> &LabelStore {
        &self.store
    }
}
