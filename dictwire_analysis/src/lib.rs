//! Measurement tooling around `dictwire_core`: how much a trained
//! dictionary saves on a corpus, when it pays for itself, and how the win
//! breaks down by message size.

pub mod analyzer;
pub mod bucket;
pub mod gzip;
pub mod ledger;
pub mod samples;

pub use analyzer::{AnalysisReport, Analyzer};
pub use bucket::{BucketRow, SizeBuckets};
pub use gzip::GzipCompressor;
pub use ledger::SavingsLedger;
pub use samples::{api_responses, file_listings, metrics_payloads, Corpus};
