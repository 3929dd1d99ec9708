use std::path::Path;

use crate::error::{Error, Result};
use crate::frame::dictionary_blob_id;

/// An immutable trained-dictionary handle.
///
/// The bytes are opaque output of the external trainer and are persisted
/// verbatim — there is no versioning layer of our own, so a dictionary
/// trained against one algorithm version is not assumed compatible with
/// another (an incompatible frame fails the dictionary-id check instead of
/// being decoded into garbage).
///
/// Once a codec holds a `Dictionary` it is never mutated, so any number of
/// engines may read it concurrently without synchronization.
#[derive(Debug, Clone)]
pub struct Dictionary {
    bytes: Vec<u8>,
    id: u32,
}

impl Dictionary {
    /// Wrap trained dictionary bytes.
    ///
    /// Trained blobs carry the zdict magic and a dictionary id; raw-content
    /// blobs are accepted too and get id 0 (frame mismatch detection is
    /// unavailable for them).
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::Configuration("dictionary is empty".into()));
        }
        let id = dictionary_blob_id(&bytes);
        Ok(Self { bytes, id })
    }

    /// Load a dictionary file written by [`save`](Self::save) or any
    /// external trainer.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Error::Configuration(format!("cannot read dictionary {}: {e}", path.display()))
        })?;
        Self::from_bytes(bytes)
    }

    /// Persist the raw bytes. Saving is always explicit; training never
    /// writes to disk on its own.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the dictionary in bytes — the fixed cost the break-even
    /// analysis charges against per-message savings.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Dictionary id as embedded in the zdict header (0 for raw-content
    /// dictionaries).
    pub fn id(&self) -> u32 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_bytes() {
        assert!(matches!(
            Dictionary::from_bytes(Vec::new()),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn raw_content_gets_id_zero() {
        let dict = Dictionary::from_bytes(b"some raw content dictionary".to_vec()).unwrap();
        assert_eq!(dict.id(), 0);
        assert_eq!(dict.len(), 27);
    }

    #[test]
    fn save_load_round_trip() {
        let path = std::env::temp_dir().join("dictwire_test_dictionary.dict");
        let dict = Dictionary::from_bytes(vec![7u8; 64]).unwrap();
        dict.save(&path).unwrap();
        let loaded = Dictionary::load(&path).unwrap();
        assert_eq!(loaded.as_bytes(), dict.as_bytes());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_missing_file_is_configuration_error() {
        let err = Dictionary::load("/nonexistent/missing.dict").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
