use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::codec::{Codec, CodecConfig};
use crate::dictionary::Dictionary;
use crate::error::Result;

/// Name the plain codec registers under.
pub const NAME_ZSTD: &str = "zstd";
/// Name the dictionary codec registers under.
pub const NAME_ZSTD_DICT: &str = "zstd-dict";

/// One-shot compression behind a name. [`Codec`] implements this; anything
/// else that can round-trip bytes may register too.
pub trait Compressor: Send + Sync {
    fn name(&self) -> &str;
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

impl Compressor for Codec {
    fn name(&self) -> &str {
        Codec::name(self)
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Codec::compress(self, data)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Codec::decompress(self, data)
    }
}

fn table() -> &'static RwLock<HashMap<String, Arc<dyn Compressor>>> {
    static TABLE: OnceLock<RwLock<HashMap<String, Arc<dyn Compressor>>>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Register a compressor under its own name. Re-registering a name replaces
/// the previous entry.
pub fn register(compressor: Arc<dyn Compressor>) {
    if let Ok(mut table) = table().write() {
        table.insert(compressor.name().to_string(), compressor);
    }
}

/// Look up a registered compressor by name.
pub fn lookup(name: &str) -> Option<Arc<dyn Compressor>> {
    table().read().ok()?.get(name).cloned()
}

/// Like [`lookup`], but an unknown name is an error rather than a miss.
pub fn lookup_required(name: &str) -> Result<Arc<dyn Compressor>> {
    lookup(name).ok_or_else(|| crate::error::Error::UnsupportedEncoding(name.to_string()))
}

/// Register the stock codecs: a plain `zstd` codec always, and a `zstd-dict`
/// codec when a dictionary is supplied.
pub fn register_default_codecs(dictionary: Option<Dictionary>) -> Result<()> {
    register(Arc::new(Codec::new(CodecConfig::plain(NAME_ZSTD))?));
    if let Some(dict) = dictionary {
        register(Arc::new(Codec::new(CodecConfig::with_dictionary(
            NAME_ZSTD_DICT,
            dict,
        ))?));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // The table is process-global and tests run in parallel, so every test
    // uses names no other test touches.

    #[test]
    fn lookup_unknown_name_misses() {
        assert!(lookup("registry-test-unknown").is_none());
        assert!(matches!(
            lookup_required("registry-test-unknown"),
            Err(crate::error::Error::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn register_then_lookup() {
        let codec = Codec::new(CodecConfig::plain("registry-test-plain")).unwrap();
        register(Arc::new(codec));
        let found = lookup("registry-test-plain").unwrap();
        assert_eq!(found.name(), "registry-test-plain");
        let frame = found.compress(b"hello registry").unwrap();
        assert_eq!(found.decompress(&frame).unwrap(), b"hello registry");
    }

    #[test]
    fn reregistering_replaces() {
        let first = Codec::new(CodecConfig::plain("registry-test-replace")).unwrap();
        register(Arc::new(first));
        let second =
            Codec::new(CodecConfig::plain("registry-test-replace").level(9)).unwrap();
        register(Arc::new(second));
        assert!(lookup("registry-test-replace").is_some());
    }
}
