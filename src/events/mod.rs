// Gesture classification module
// Feature vectors, nearest-neighbor backends, and the incremental classifier

pub mod backend;
pub mod classifier;
pub mod history;
#[cfg(feature = "kd-tree")]
pub mod knn;
pub mod types;

pub use backend::{IndexBackend, NeighborIndex, K, MIN_TRAINING_ROWS, SUBSAMPLE};
#[cfg(feature = "kd-tree")]
pub use knn::KnnIndex;
pub use classifier::{ClassifierError, ClassifierResult, IncrementalClassifier};
pub use history::ClassificationHistory;
pub use types::{FeatureVector, GestureClass, InvalidClass, TrainingSet, CHANNELS, NUM_CLASSES};
