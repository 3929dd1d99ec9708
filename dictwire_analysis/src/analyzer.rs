use dictwire_core::{Codec, CodecConfig, Compressor, Dictionary, Result, TrainOptions, DEFAULT_LEVEL};

use crate::bucket::{BucketRow, SizeBuckets};
use crate::gzip::GzipCompressor;
use crate::ledger::SavingsLedger;
use crate::samples::Corpus;

/// Compresses every message twice, with and without the dictionary, and
/// reports what the dictionary actually buys. A gzip pass rides along as
/// the no-dictionary baseline most deployments start from.
pub struct Analyzer {
    plain: Codec,
    dict: Codec,
    gzip: GzipCompressor,
}

/// Outcome of one [`Analyzer::run`].
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub dictionary_size: usize,
    pub messages: usize,
    pub original_total: u64,
    pub gzip_total: u64,
    pub plain_total: u64,
    pub dict_total: u64,
    pub savings: i64,
    pub break_even: Option<usize>,
    pub buckets: Vec<BucketRow>,
}

impl AnalysisReport {
    /// Dictionary-to-plain size ratio over the whole run.
    pub fn ratio(&self) -> f64 {
        if self.plain_total == 0 {
            return 1.0;
        }
        self.dict_total as f64 / self.plain_total as f64
    }

    /// Mean signed savings per message in bytes.
    pub fn average_savings(&self) -> f64 {
        if self.messages == 0 {
            return 0.0;
        }
        self.savings as f64 / self.messages as f64
    }
}

impl Analyzer {
    pub fn new(dictionary: Dictionary, level: i32) -> Result<Self> {
        Ok(Self {
            plain: Codec::new(CodecConfig::plain("zstd").level(level))?,
            dict: Codec::new(CodecConfig::with_dictionary("zstd-dict", dictionary).level(level))?,
            gzip: GzipCompressor::new(),
        })
    }

    /// Train on the corpus's training half and return an analyzer ready to
    /// run against the evaluation half.
    pub fn for_corpus(corpus: &Corpus, options: &TrainOptions) -> Result<Self> {
        let (training, _) = corpus.split();
        let dictionary = dictwire_core::train(training, options)?;
        Self::new(dictionary, DEFAULT_LEVEL)
    }

    /// Run the evaluation messages through both codecs.
    pub fn run<S: AsRef<[u8]>>(&self, messages: &[S]) -> Result<AnalysisReport> {
        let mut ledger = SavingsLedger::new(self.dict.dictionary_size());
        let mut buckets = SizeBuckets::new();
        let mut original_total = 0u64;
        let mut gzip_total = 0u64;
        for message in messages {
            let message = message.as_ref();
            let plain_len = self.plain.compress(message)?.len();
            let dict_len = self.dict.compress(message)?.len();
            original_total += message.len() as u64;
            gzip_total += self.gzip.compress(message)?.len() as u64;
            ledger.record(plain_len, dict_len);
            buckets.record(message.len(), plain_len, dict_len);
        }
        Ok(AnalysisReport {
            dictionary_size: ledger.dictionary_size(),
            messages: ledger.messages(),
            original_total,
            gzip_total,
            plain_total: ledger.plain_total(),
            dict_total: ledger.dict_total(),
            savings: ledger.savings(),
            break_even: ledger.break_even(),
            buckets: buckets.report(),
        })
    }
}
