use thiserror::Error;

/// Failure taxonomy for the codec layer.
///
/// A pool miss is deliberately absent: an empty pool falls back to direct
/// engine construction and only a construction failure (malformed
/// dictionary bytes) surfaces, as [`Error::Configuration`].
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid setup: missing/empty dictionary source, a training corpus
    /// below the minimum sample count, or an engine that cannot be
    /// constructed from the configured dictionary. Fatal, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Decompression input is not a valid frame, is truncated, or declares
    /// an output size beyond the one-shot limit. No partial output is ever
    /// returned.
    #[error("corrupt frame: {0}")]
    Corruption(String),

    /// The frame header declares a dictionary other than the configured
    /// one. Rejected before any payload byte is interpreted; decoding with
    /// the wrong dictionary would produce garbage, not an error.
    #[error("frame requires dictionary {frame:#010x} but codec is configured with {configured:#010x}")]
    DictionaryMismatch { frame: u32, configured: u32 },

    /// A codec name was requested that no one registered. Handled at the
    /// transport boundary; never silently downgraded to another encoding.
    #[error("unsupported encoding {0:?}")]
    UnsupportedEncoding(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
