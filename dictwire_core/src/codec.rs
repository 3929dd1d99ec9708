use std::io::{self, BufReader, Read, Write};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use zstd::bulk;
use zstd::dict::{DecoderDictionary, EncoderDictionary};
use zstd::stream;

use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::frame::FrameInfo;
use crate::pool::Pool;

/// Default compression level. Middle of the road; callers that know their
/// corpus tune it through [`CodecConfig`].
pub const DEFAULT_LEVEL: i32 = 3;

/// Capacity used for frames that do not declare a content size (streaming
/// output omits it).
const FALLBACK_CAPACITY: usize = 16 << 20;

/// Upper bound on a declared content size before we call the frame corrupt
/// rather than allocate for it.
const MAX_DECLARED_CAPACITY: u64 = 1 << 30;

// ── configuration ───────────────────────────────────────────────────────────

/// Everything needed to build a [`Codec`].
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Name the codec registers under and reports in errors.
    pub name: String,
    /// Optional trained dictionary. `None` builds a plain codec.
    pub dictionary: Option<Dictionary>,
    /// Compression level, 1..=22.
    pub level: i32,
}

impl CodecConfig {
    /// Config for a plain codec with no dictionary.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dictionary: None,
            level: DEFAULT_LEVEL,
        }
    }

    /// Config for a dictionary codec.
    pub fn with_dictionary(name: impl Into<String>, dictionary: Dictionary) -> Self {
        Self {
            name: name.into(),
            dictionary: Some(dictionary),
            level: DEFAULT_LEVEL,
        }
    }

    pub fn level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }
}

// ── codec ───────────────────────────────────────────────────────────────────

/// A zstd codec bound to at most one dictionary for its whole lifetime.
///
/// One-shot engines are pooled and reused across calls; streaming endpoints
/// are built per stream on top of a prepared dictionary shared by reference,
/// so the dictionary is parsed once at construction no matter how many
/// streams are opened.
pub struct Codec {
    name: String,
    level: i32,
    dictionary: Option<Arc<Dictionary>>,
    prepared_enc: Option<EncoderDictionary<'static>>,
    prepared_dec: Option<DecoderDictionary<'static>>,
    encoders: Pool<bulk::Compressor<'static>>,
    decoders: Pool<bulk::Decompressor<'static>>,
}

// SAFETY: the prepared dictionaries are built once in `new` and never
// mutated afterwards, and libzstd permits concurrent read-only use of
// CDict/DDict. The engine pools hold their contents behind a mutex.
unsafe impl Send for Codec {}
unsafe impl Sync for Codec {}

impl Codec {
    pub fn new(config: CodecConfig) -> Result<Self> {
        if !(1..=22).contains(&config.level) {
            return Err(Error::Configuration(format!(
                "compression level {} out of range 1..=22",
                config.level
            )));
        }
        let dictionary = config.dictionary.map(Arc::new);
        let (prepared_enc, prepared_dec) = match &dictionary {
            Some(dict) => (
                Some(EncoderDictionary::copy(dict.as_bytes(), config.level)),
                Some(DecoderDictionary::copy(dict.as_bytes())),
            ),
            None => (None, None),
        };
        Ok(Self {
            name: config.name,
            level: config.level,
            dictionary,
            prepared_enc,
            prepared_dec,
            encoders: Pool::new(),
            decoders: Pool::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn has_dictionary(&self) -> bool {
        self.dictionary.is_some()
    }

    /// Dictionary id frames produced by this codec will carry, 0 when plain.
    pub fn dictionary_id(&self) -> u32 {
        self.dictionary.as_ref().map_or(0, |d| d.id())
    }

    /// Size of the loaded dictionary in bytes, 0 when plain.
    pub fn dictionary_size(&self) -> usize {
        self.dictionary.as_ref().map_or(0, |d| d.len())
    }

    // ── one-shot ────────────────────────────────────────────────────────────

    /// Compress `data` into a fresh buffer.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = self.encoder()?;
        encoder
            .compress(data)
            .map_err(|e| Error::Corruption(format!("compress: {e}")))
    }

    /// Compress `data`, appending the frame to `dst`. Existing bytes in
    /// `dst` are left untouched. Returns the number of bytes appended.
    pub fn compress_into(&self, data: &[u8], dst: &mut Vec<u8>) -> Result<usize> {
        let start = dst.len();
        let bound = zstd::zstd_safe::compress_bound(data.len());
        dst.resize(start + bound, 0);
        let mut encoder = self.encoder()?;
        let written = encoder
            .compress_to_buffer(data, &mut dst[start..])
            .map_err(|e| Error::Corruption(format!("compress: {e}")))?;
        dst.truncate(start + written);
        Ok(written)
    }

    /// Decompress a whole frame into a fresh buffer.
    ///
    /// Frames that name a different dictionary than this codec holds are
    /// rejected before any decoding happens. Frames that name no dictionary
    /// decode under any codec.
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let capacity = self.frame_capacity(data)?;
        let mut decoder = self.decoder()?;
        decoder
            .decompress(data, capacity)
            .map_err(|e| Error::Corruption(format!("decompress: {e}")))
    }

    /// Decompress a whole frame, appending the output to `dst`. Returns the
    /// number of bytes appended.
    pub fn decompress_into(&self, data: &[u8], dst: &mut Vec<u8>) -> Result<usize> {
        let capacity = self.frame_capacity(data)?;
        let start = dst.len();
        dst.resize(start + capacity, 0);
        let mut decoder = self.decoder()?;
        let written = decoder
            .decompress_to_buffer(data, &mut dst[start..])
            .map_err(|e| Error::Corruption(format!("decompress: {e}")))?;
        dst.truncate(start + written);
        Ok(written)
    }

    /// Parse the frame header, enforce the dictionary-id check, and work out
    /// an output capacity.
    fn frame_capacity(&self, data: &[u8]) -> Result<usize> {
        let info = FrameInfo::parse(data)?;
        let configured = self.dictionary_id();
        if info.dictionary_id != 0 && info.dictionary_id != configured {
            return Err(Error::DictionaryMismatch {
                frame: info.dictionary_id,
                configured,
            });
        }
        match info.content_size {
            Some(size) if size > MAX_DECLARED_CAPACITY => Err(Error::Corruption(format!(
                "declared content size {size} exceeds limit"
            ))),
            Some(size) => Ok(size as usize),
            None => Ok(FALLBACK_CAPACITY),
        }
    }

    // ── streaming ───────────────────────────────────────────────────────────

    /// Open a compressing writer over `sink`. The frame is only complete
    /// once [`CompressWriter::finish`] runs (drop finishes too, discarding
    /// any error).
    pub fn writer<'a, W: Write>(&'a self, sink: W) -> Result<CompressWriter<'a, W>> {
        let inner = match &self.prepared_enc {
            Some(prepared) => stream::write::Encoder::with_prepared_dictionary(sink, prepared)?,
            None => stream::write::Encoder::new(sink, self.level)?,
        };
        Ok(CompressWriter { inner: Some(inner) })
    }

    /// Open a decompressing reader over `source`.
    ///
    /// Streaming has no pre-decode header check; a frame trained against a
    /// different dictionary surfaces as an I/O error on the first read.
    pub fn reader<'a, R: Read>(&'a self, source: R) -> Result<CompressReader<'a, R>> {
        let inner = match &self.prepared_dec {
            Some(prepared) => stream::read::Decoder::with_prepared_dictionary(
                BufReader::new(source),
                prepared,
            )?,
            None => stream::read::Decoder::new(source)?,
        };
        Ok(CompressReader { inner })
    }

    // ── engine pooling ──────────────────────────────────────────────────────

    fn encoder(&self) -> Result<PooledEngine<'_, bulk::Compressor<'static>>> {
        let engine = match self.encoders.acquire() {
            Some(engine) => engine,
            None => self.new_encoder()?,
        };
        Ok(PooledEngine {
            engine: Some(engine),
            pool: &self.encoders,
        })
    }

    fn decoder(&self) -> Result<PooledEngine<'_, bulk::Decompressor<'static>>> {
        let engine = match self.decoders.acquire() {
            Some(engine) => engine,
            None => self.new_decoder()?,
        };
        Ok(PooledEngine {
            engine: Some(engine),
            pool: &self.decoders,
        })
    }

    fn new_encoder(&self) -> Result<bulk::Compressor<'static>> {
        let encoder = match &self.dictionary {
            Some(dict) => bulk::Compressor::with_dictionary(self.level, dict.as_bytes()),
            None => bulk::Compressor::new(self.level),
        };
        encoder.map_err(|e| Error::Configuration(format!("cannot build encoder: {e}")))
    }

    fn new_decoder(&self) -> Result<bulk::Decompressor<'static>> {
        let decoder = match &self.dictionary {
            Some(dict) => bulk::Decompressor::with_dictionary(dict.as_bytes()),
            None => bulk::Decompressor::new(),
        };
        decoder.map_err(|e| Error::Configuration(format!("cannot build decoder: {e}")))
    }
}

/// A pooled engine on loan from a codec. Returns itself to the pool on drop,
/// so engines are never leaked on an error path.
struct PooledEngine<'a, T> {
    engine: Option<T>,
    pool: &'a Pool<T>,
}

impl<T> Deref for PooledEngine<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.engine.as_ref().unwrap()
    }
}

impl<T> DerefMut for PooledEngine<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.engine.as_mut().unwrap()
    }
}

impl<T> Drop for PooledEngine<'_, T> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            self.pool.release(engine);
        }
    }
}

// ── streaming endpoints ─────────────────────────────────────────────────────

/// Compressing writer produced by [`Codec::writer`].
pub struct CompressWriter<'a, W: Write> {
    inner: Option<stream::write::Encoder<'a, W>>,
}

impl<W: Write> CompressWriter<'_, W> {
    /// Flush the frame epilogue and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        let inner = self.inner.take().ok_or_else(|| {
            Error::Corruption("compress writer already finished".into())
        })?;
        Ok(inner.finish()?)
    }
}

impl<W: Write> Write for CompressWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner.as_mut() {
            Some(inner) => inner.write(buf),
            None => Err(io::Error::other("compress writer already finished")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write> Drop for CompressWriter<'_, W> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            let _ = inner.finish();
        }
    }
}

/// Decompressing reader produced by [`Codec::reader`].
pub struct CompressReader<'a, R: Read> {
    inner: stream::read::Decoder<'a, BufReader<R>>,
}

impl<R: Read> Read for CompressReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}
