use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use dictwire_core::{Compressor, Error, Result};

/// Gzip baseline for comparisons. No dictionary support, so it shows what a
/// widely deployed general-purpose codec gets on the same corpus.
pub struct GzipCompressor {
    level: Compression,
}

impl GzipCompressor {
    pub fn new() -> Self {
        Self {
            level: Compression::default(),
        }
    }

    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level),
        }
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor for GzipCompressor {
    fn name(&self) -> &str {
        "gzip"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), self.level);
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        GzDecoder::new(data)
            .read_to_end(&mut out)
            .map_err(|e| Error::Corruption(format!("gzip decompress: {e}")))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let gzip = GzipCompressor::new();
        let data = b"gzip baseline round trip, gzip baseline round trip".to_vec();
        let packed = gzip.compress(&data).unwrap();
        assert_eq!(gzip.decompress(&packed).unwrap(), data);
    }

    #[test]
    fn garbage_is_corruption() {
        let gzip = GzipCompressor::new();
        assert!(matches!(
            gzip.decompress(b"not gzip at all"),
            Err(Error::Corruption(_))
        ));
    }
}
