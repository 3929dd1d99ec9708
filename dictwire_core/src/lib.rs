pub mod codec;
pub mod dictionary;
pub mod error;
pub mod frame;
pub mod pool;
pub mod registry;
pub mod train;

pub use codec::{Codec, CodecConfig, CompressReader, CompressWriter, DEFAULT_LEVEL};
pub use dictionary::Dictionary;
pub use error::{Error, Result};
pub use frame::FrameInfo;
pub use registry::{
    lookup, lookup_required, register, register_default_codecs, Compressor, NAME_ZSTD,
    NAME_ZSTD_DICT,
};
pub use train::{train, train_from_dir, TrainOptions, DEFAULT_MAX_SIZE, MIN_TRAINING_SAMPLES};
