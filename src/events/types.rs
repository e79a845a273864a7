// Gesture classification types
// Defines class labels, feature vectors and the in-memory training set

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of gesture classes (labels 0-9)
pub const NUM_CLASSES: usize = 10;

/// Number of sensor channels per sample
pub const CHANNELS: usize = 8;

/// Size in bytes of one stored record (8 x u16)
pub const RECORD_SIZE: usize = CHANNELS * 2;

/// One sample of raw sensor channels at one instant
pub type FeatureVector = [u16; CHANNELS];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid gesture class {0}: must be in 0..=9")]
pub struct InvalidClass(pub u8);

/// Gesture class label in [0, 9]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct GestureClass(u8);

impl GestureClass {
    /// Default answer when there is not enough data to classify
    pub const COLD_START: GestureClass = GestureClass(0);

    pub fn new(index: u8) -> Result<Self, InvalidClass> {
        if (index as usize) < NUM_CLASSES {
            Ok(GestureClass(index))
        } else {
            Err(InvalidClass(index))
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// All classes in ascending order
    pub fn all() -> impl Iterator<Item = GestureClass> {
        (0..NUM_CLASSES as u8).map(GestureClass)
    }
}

impl TryFrom<u8> for GestureClass {
    type Error = InvalidClass;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        GestureClass::new(value)
    }
}

impl From<GestureClass> for u8 {
    fn from(class: GestureClass) -> u8 {
        class.0
    }
}

impl std::fmt::Display for GestureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Squared Euclidean distance between two feature vectors
pub fn squared_distance(a: &FeatureVector, b: &FeatureVector) -> u64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x.abs_diff(y) as u64;
            d * d
        })
        .sum()
}

/// Encode a feature vector as 8 little-endian u16 values
pub fn encode_record(vector: &FeatureVector) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    for (chunk, value) in buf.chunks_exact_mut(2).zip(vector.iter()) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
    buf
}

/// Decode one 16-byte record. Caller guarantees `bytes.len() == RECORD_SIZE`
pub fn decode_record(bytes: &[u8]) -> FeatureVector {
    let mut vector = [0u16; CHANNELS];
    for (value, chunk) in vector.iter_mut().zip(bytes.chunks_exact(2)) {
        *value = u16::from_le_bytes([chunk[0], chunk[1]]);
    }
    vector
}

/// Feature matrix paired 1:1 with its label vector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingSet {
    rows: Vec<FeatureVector>,
    labels: Vec<GestureClass>,
}

impl TrainingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set where every row carries the same label
    pub fn for_class(class: GestureClass, rows: Vec<FeatureVector>) -> Self {
        let labels = vec![class; rows.len()];
        TrainingSet { rows, labels }
    }

    pub fn push(&mut self, vector: FeatureVector, class: GestureClass) {
        self.rows.push(vector);
        self.labels.push(class);
    }

    /// Append all rows of another set, preserving order
    pub fn extend(&mut self, other: TrainingSet) {
        self.rows.extend(other.rows);
        self.labels.extend(other.labels);
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn labels(&self) -> &[GestureClass] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every `step`-th row starting at row 0, with matching labels
    pub fn subsample(&self, step: usize) -> TrainingSet {
        let step = step.max(1);
        TrainingSet {
            rows: self.rows.iter().step_by(step).copied().collect(),
            labels: self.labels.iter().step_by(step).copied().collect(),
        }
    }

    /// Row count per class label
    pub fn class_counts(&self) -> [usize; NUM_CLASSES] {
        let mut counts = [0usize; NUM_CLASSES];
        for label in &self.labels {
            counts[label.index()] += 1;
        }
        counts
    }
}
