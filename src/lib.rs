// Gesture KNN - online nearest-neighbor gesture trainer
// Module declarations

pub mod commands;
pub mod config;
pub mod events;
pub mod state;

pub use commands::{Classification, CommandError, CommandResult, SessionSnapshot, TrainerSession};
pub use config::{ConfigError, TrainerConfig};
pub use events::{
    ClassificationHistory, ClassifierError, FeatureVector, GestureClass, IncrementalClassifier,
    IndexBackend, CHANNELS, NUM_CLASSES,
};
pub use state::{LabelStore, StorageError};

/// Parse a feature vector from 8 integers separated by commas and/or whitespace
pub fn parse_vector(s: &str) -> Result<FeatureVector, String> {
    let values: Vec<u16> = s
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u16>()
                .map_err(|e| format!("Failed to parse value '{}': {}", part, e))
        })
        .collect::<Result<_, _>>()?;

    values
        .try_into()
        .map_err(|v: Vec<u16>| format!("Expected {} values, got {}", CHANNELS, v.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vector() {
        assert_eq!(
            parse_vector("1, 2,3 4 5,6 7   8").unwrap(),
            [1, 2, 3, 4, 5, 6, 7, 8]
        );
        assert_eq!(parse_vector("65535 0 0 0 0 0 0 0").unwrap()[0], 65535);
    }

    #[test]
    fn test_parse_vector_errors() {
        assert!(parse_vector("1 2 3").is_err());
        assert!(parse_vector("1 2 3 4 5 6 7 8 9").is_err());
        assert!(parse_vector("1 2 3 4 5 6 7 -8").is_err());
        assert!(parse_vector("1 2 3 4 5 6 7 65536").is_err());
    }
}
