use std::path::Path;

use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::frame::DICTIONARY_MAGIC;

/// Fewer samples than this and the trainer refuses outright; the output
/// would memorize the inputs instead of generalizing.
pub const MIN_TRAINING_SAMPLES: usize = 10;

/// Default trained-dictionary size cap.
pub const DEFAULT_MAX_SIZE: usize = 32 * 1024;

/// Knobs for [`train`].
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Upper bound on the dictionary size in bytes.
    pub max_size: usize,
    /// Force a specific dictionary id instead of the trainer's random one.
    /// Useful when deployments must agree on ids ahead of time.
    pub id: Option<u32>,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            id: None,
        }
    }
}

/// Train a dictionary from representative samples.
///
/// Samples should look like production payloads; the trainer keys on
/// substrings shared across them. The result is at most `max_size` bytes.
pub fn train<S: AsRef<[u8]>>(samples: &[S], options: &TrainOptions) -> Result<Dictionary> {
    if samples.len() < MIN_TRAINING_SAMPLES {
        return Err(Error::Configuration(format!(
            "{} training samples, need at least {MIN_TRAINING_SAMPLES}",
            samples.len()
        )));
    }
    if options.max_size == 0 {
        return Err(Error::Configuration("max dictionary size is zero".into()));
    }

    let mut continuous = Vec::new();
    let mut sizes = Vec::with_capacity(samples.len());
    for sample in samples {
        let bytes = sample.as_ref();
        continuous.extend_from_slice(bytes);
        sizes.push(bytes.len());
    }
    if continuous.is_empty() {
        return Err(Error::Configuration("all training samples are empty".into()));
    }

    let mut blob = zstd::dict::from_continuous(&continuous, &sizes, options.max_size)
        .map_err(|e| Error::Configuration(format!("training failed: {e}")))?;
    if blob.is_empty() {
        return Err(Error::Configuration(
            "trainer produced an empty dictionary".into(),
        ));
    }

    if let Some(id) = options.id {
        stamp_id(&mut blob, id)?;
    }
    Dictionary::from_bytes(blob)
}

/// Train from every regular file in a directory, one file per sample.
/// Files are taken in name order so the same directory always trains the
/// same dictionary.
pub fn train_from_dir(dir: impl AsRef<Path>, options: &TrainOptions) -> Result<Dictionary> {
    let dir = dir.as_ref();
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let mut samples = Vec::with_capacity(paths.len());
    for path in &paths {
        samples.push(std::fs::read(path)?);
    }
    train(&samples, options)
}

/// Overwrite the id field of a trained blob. The id lives in the four bytes
/// after the dictionary magic.
fn stamp_id(blob: &mut [u8], id: u32) -> Result<()> {
    if blob.len() < 8 || blob[0..4] != DICTIONARY_MAGIC.to_le_bytes() {
        return Err(Error::Configuration(
            "cannot set id on a raw-content dictionary".into(),
        ));
    }
    blob[4..8].copy_from_slice(&id.to_le_bytes());
    Ok(())
}
