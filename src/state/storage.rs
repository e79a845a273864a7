// Per-class append-only label store
// One binary file per gesture class holding packed little-endian u16 records
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::events::types::{
    decode_record, encode_record, FeatureVector, GestureClass, TrainingSet, RECORD_SIZE,
};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Corrupt store file {path:?} for class {class}: {len} bytes is not a whole number of records")]
    Corrupt {
        class: GestureClass,
        path: PathBuf,
        len: u64,
    },
    #[error("Failed to get app data directory")]
    NoAppDataDir,
}

pub type StorageResult<T> = Result<T, StorageError>;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Get the default data directory for the label store
pub fn get_app_data_dir() -> StorageResult<PathBuf> {
    let data_dir = dirs::data_dir().ok_or(StorageError::NoAppDataDir)?;
    Ok(data_dir.join("gesture-knn"))
}

/// Durable per-class storage of feature vectors (`vals0.dat` .. `vals9.dat`)
#[derive(Debug, Clone)]
pub struct LabelStore {
    dir: PathBuf,
}

impl LabelStore {
    /// Open a store rooted at `dir`, creating the directory and any
    /// missing class files
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        let store = LabelStore { dir };
        store.ensure_files()?;
        log::info!("Opened label store at {}", store.dir.display());
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self, class: GestureClass) -> PathBuf {
        self.dir.join(format!("vals{}.dat", class))
    }

    /// Create every class file that does not exist yet; existing content is untouched
    pub fn ensure_files(&self) -> StorageResult<()> {
        for class in GestureClass::all() {
            let path = self.file_path(class);
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(io_error(&path))?;
        }
        Ok(())
    }

    /// Append one record to the class file.
    /// The whole record goes out in a single append write.
    pub fn append(&self, class: GestureClass, vector: &FeatureVector) -> StorageResult<()> {
        let path = self.file_path(class);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_error(&path))?;

        file.write_all(&encode_record(vector)).map_err(io_error(&path))?;
        file.flush().map_err(io_error(&path))?;
        Ok(())
    }

    /// Read every record of one class in append order
    pub fn read_class(&self, class: GestureClass) -> StorageResult<Vec<FeatureVector>> {
        let path = self.file_path(class);
        let bytes = fs::read(&path).map_err(io_error(&path))?;

        if bytes.len() % RECORD_SIZE != 0 {
            return Err(StorageError::Corrupt {
                class,
                path,
                len: bytes.len() as u64,
            });
        }

        Ok(bytes.chunks_exact(RECORD_SIZE).map(decode_record).collect())
    }

    /// Read all 10 class files, in class order, each as a single-label set
    pub fn read_all(&self) -> StorageResult<Vec<TrainingSet>> {
        GestureClass::all()
            .map(|class| Ok(TrainingSet::for_class(class, self.read_class(class)?)))
            .collect()
    }

    /// Number of records currently stored for a class
    pub fn record_count(&self, class: GestureClass) -> StorageResult<usize> {
        let path = self.file_path(class);
        let metadata = fs::metadata(&path).map_err(io_error(&path))?;
        if !metadata.is_file() {
            return Err(io_error(&path)(std::io::Error::other("not a regular file")));
        }
        let len = metadata.len();
        if len % RECORD_SIZE as u64 != 0 {
            return Err(StorageError::Corrupt { class, path, len });
        }
        Ok((len / RECORD_SIZE as u64) as usize)
    }

    /// Truncate every class file to zero length. Irreversible.
    /// A failing file does not stop the others; the first error is returned.
    pub fn clear(&self) -> StorageResult<()> {
        let mut first_error = None;
        for class in GestureClass::all() {
            let path = self.file_path(class);
            if let Err(e) = File::create(&path).map_err(io_error(&path)) {
                log::error!("Failed to truncate class {}: {}", class, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                log::warn!("Cleared all class files in {}", self.dir.display());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::{NUM_CLASSES, CHANNELS};
    use tempfile::TempDir;

    fn class(i: u8) -> GestureClass {
        GestureClass::new(i).unwrap()
    }

    #[test]
    fn test_open_creates_empty_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = LabelStore::open(temp_dir.path().join("store")).unwrap();

        for c in GestureClass::all() {
            let path = store.file_path(c);
            assert!(path.exists());
            assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        }
        assert_eq!(store.file_path(class(4)).file_name().unwrap(), "vals4.dat");
    }

    #[test]
    fn test_open_keeps_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let store = LabelStore::open(temp_dir.path()).unwrap();
        store.append(class(2), &[9; CHANNELS]).unwrap();

        let reopened = LabelStore::open(temp_dir.path()).unwrap();
        assert_eq!(reopened.read_class(class(2)).unwrap(), vec![[9; CHANNELS]]);
    }

    #[test]
    fn test_append_read_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = LabelStore::open(temp_dir.path()).unwrap();

        let vectors: Vec<FeatureVector> = (0..20u16)
            .map(|i| [i, i * 2, i * 3, 65535 - i, 0, 1, 300 + i, 65535])
            .collect();
        for v in &vectors {
            store.append(class(5), v).unwrap();
        }

        assert_eq!(store.read_class(class(5)).unwrap(), vectors);
        assert_eq!(store.record_count(class(5)).unwrap(), 20);
        assert_eq!(
            fs::metadata(store.file_path(class(5))).unwrap().len(),
            20 * RECORD_SIZE as u64
        );
    }

    #[test]
    fn test_read_all_in_class_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = LabelStore::open(temp_dir.path()).unwrap();
        store.append(class(7), &[7; CHANNELS]).unwrap();
        store.append(class(0), &[0; CHANNELS]).unwrap();
        store.append(class(7), &[70; CHANNELS]).unwrap();

        let sets = store.read_all().unwrap();
        assert_eq!(sets.len(), NUM_CLASSES);
        assert_eq!(sets[0].rows(), &[[0; CHANNELS]]);
        assert_eq!(sets[7].rows(), &[[7; CHANNELS], [70; CHANNELS]]);
        assert_eq!(sets[7].labels(), &[class(7), class(7)]);
        assert!(sets[3].is_empty());
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = LabelStore::open(temp_dir.path()).unwrap();
        store.append(class(1), &[1; CHANNELS]).unwrap();

        let mut file = OpenOptions::new()
            .append(true)
            .open(store.file_path(class(1)))
            .unwrap();
        file.write_all(&[0xAB, 0xCD, 0xEF]).unwrap();

        match store.read_all() {
            Err(StorageError::Corrupt { class: c, len, .. }) => {
                assert_eq!(c, class(1));
                assert_eq!(len, 19);
            }
            other => panic!("expected corrupt store error, got {:?}", other),
        }
        assert!(matches!(
            store.record_count(class(1)),
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_clear_truncates_all_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = LabelStore::open(temp_dir.path()).unwrap();
        for c in GestureClass::all() {
            store.append(c, &[c.index() as u16; CHANNELS]).unwrap();
        }

        store.clear().unwrap();

        for c in GestureClass::all() {
            assert_eq!(fs::metadata(store.file_path(c)).unwrap().len(), 0);
        }
        assert!(store.read_all().unwrap().iter().all(|s| s.is_empty()));
    }

    #[test]
    fn test_clear_continues_past_failing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = LabelStore::open(temp_dir.path()).unwrap();
        for c in GestureClass::all() {
            store.append(c, &[1; CHANNELS]).unwrap();
        }
        let blocked = store.file_path(class(5));
        fs::remove_file(&blocked).unwrap();
        fs::create_dir(&blocked).unwrap();

        assert!(matches!(store.clear(), Err(StorageError::Io { .. })));

        for c in GestureClass::all().filter(|&c| c != class(5)) {
            assert_eq!(store.record_count(c).unwrap(), 0);
        }
        assert!(matches!(store.record_count(class(5)), Err(StorageError::Io { .. })));
    }

    #[test]
    fn test_append_to_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = LabelStore::open(temp_dir.path().join("gone")).unwrap();
        fs::remove_dir_all(store.dir()).unwrap();

        let result = store.append(class(0), &[0; CHANNELS]);
        assert!(matches!(result, Err(StorageError::Io { .. })));
    }
}
