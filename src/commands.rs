// Training session commands
// Serializes every operation on the classifier behind one lock
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::TrainerConfig;
use crate::events::{
    ClassificationHistory, FeatureVector, GestureClass, IncrementalClassifier, NUM_CLASSES,
};
use crate::state::LabelStore;

#[derive(Debug, Serialize)]
pub struct CommandError {
    message: String,
}

impl<E: std::fmt::Display> From<E> for CommandError {
    fn from(error: E) -> Self {
        CommandError {
            message: error.to_string(),
        }
    }
}

impl CommandError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Result of handling one incoming vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Decision for this vector alone
    pub class: GestureClass,

    /// Most common class over the recent history window
    pub smoothed: GestureClass,

    /// Whether the vector was stored as a training sample first
    pub recorded: bool,
}

/// Display-oriented view of the session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub counts: [usize; NUM_CLASSES],
    pub history_counts: [usize; NUM_CLASSES],
    pub smoothed: GestureClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording: Option<GestureClass>,
    pub total_rows: usize,
    pub indexed: bool,
}

struct SessionState {
    classifier: IncrementalClassifier,
    recording: Option<GestureClass>,
    history: ClassificationHistory,
}

/// Thread-safe training session wrapper
pub struct TrainerSession {
    state: Arc<Mutex<SessionState>>,
}

impl Clone for TrainerSession {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl TrainerSession {
    pub fn new(classifier: IncrementalClassifier, history_len: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                classifier,
                recording: None,
                history: ClassificationHistory::new(history_len),
            })),
        }
    }

    /// Open the store described by `config` and load it
    pub fn open(config: &TrainerConfig) -> CommandResult<Self> {
        let dir = config.resolve_data_dir()?;
        let store = LabelStore::open(dir)?;
        let classifier = IncrementalClassifier::open(store, config.backend())?;
        log::info!(
            "Training session ready: {} rows, backend {:?}",
            classifier.len(),
            classifier.backend()
        );
        Ok(Self::new(classifier, config.history_len))
    }

    fn lock(&self) -> CommandResult<MutexGuard<'_, SessionState>> {
        self.state
            .lock()
            .map_err(|_| CommandError::from("Training session lock poisoned"))
    }

    /// Start (`Some`) or stop (`None`) recording incoming vectors under a label
    pub fn set_recording(&self, class: Option<GestureClass>) -> CommandResult<()> {
        let mut state = self.lock()?;
        if state.recording != class {
            match class {
                Some(c) => log::info!("Recording class {}", c),
                None => log::info!("Stopped recording"),
            }
        }
        state.recording = class;
        Ok(())
    }

    /// Store the vector if recording, then classify it
    pub fn handle_vector(&self, vector: FeatureVector) -> CommandResult<Classification> {
        let mut state = self.lock()?;

        let recording = state.recording;
        let recorded = match recording {
            Some(class) => {
                state.classifier.store_and_retrain(class, vector)?;
                true
            }
            None => false,
        };

        let class = state.classifier.classify(&vector);
        state.history.push(class);

        Ok(Classification {
            class,
            smoothed: state.history.most_common(),
            recorded,
        })
    }

    /// Classify without storing or touching the history
    pub fn classify(&self, vector: &FeatureVector) -> CommandResult<GestureClass> {
        Ok(self.lock()?.classifier.classify(vector))
    }

    pub fn reload(&self) -> CommandResult<()> {
        self.lock()?.classifier.reload_from_store()?;
        Ok(())
    }

    /// Delete all stored samples. Callers handle any confirmation.
    pub fn reset(&self) -> CommandResult<()> {
        self.lock()?.classifier.clear()?;
        Ok(())
    }

    pub fn snapshot(&self) -> CommandResult<SessionSnapshot> {
        let state = self.lock()?;
        Ok(SessionSnapshot {
            counts: state.classifier.class_counts(),
            history_counts: state.history.counts(),
            smoothed: state.history.most_common(),
            recording: state.recording,
            total_rows: state.classifier.len(),
            indexed: state.classifier.is_indexed(),
        })
    }
}
