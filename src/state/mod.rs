// State management module
// Handles on-disk persistence of labeled samples

pub mod storage;

pub use storage::{get_app_data_dir, LabelStore, StorageError, StorageResult};
