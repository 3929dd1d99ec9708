use std::net::TcpListener;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use dictwire_core::{train_from_dir, Dictionary, TrainOptions};
use dictwire_analysis::{Analyzer, GzipCompressor};

mod listing;
mod scenarios;
mod transport;

use transport::{Request, ServerConfig};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "dictwire",
    about = "Dictionary compression toolkit — train dictionaries, serve compressed listings, measure savings",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a dictionary from sample files in a directory
    Train {
        /// Directory of sample files, one message per file
        samples: PathBuf,
        /// Destination dictionary file
        output: PathBuf,
        /// Maximum dictionary size in bytes
        #[arg(long, default_value_t = dictwire_core::DEFAULT_MAX_SIZE)]
        max_size: usize,
        /// Force a specific dictionary id instead of a trainer-chosen one
        #[arg(long)]
        id: Option<u32>,
    },
    /// Serve directory listings over TCP, compressed on request
    Serve {
        /// Directory to serve listings of
        root: PathBuf,
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:4915")]
        addr: String,
        /// Dictionary file; enables the zstd-dict encoding
        #[arg(short, long)]
        dictionary: Option<PathBuf>,
        /// Recursion depth cap applied to every request
        #[arg(long, default_value_t = 8)]
        max_depth: u32,
    },
    /// Request a listing from a running server
    List {
        /// Path below the served root ("" lists the root itself)
        #[arg(default_value = "")]
        path: String,
        /// Server address
        #[arg(short, long, default_value = "127.0.0.1:4915")]
        addr: String,
        /// Response encoding: zstd | zstd-dict | gzip | none
        #[arg(short, long, default_value = "zstd")]
        encoding: String,
        /// Dictionary file, required to decode zstd-dict responses
        #[arg(long)]
        dictionary: Option<PathBuf>,
        /// Requested recursion depth
        #[arg(long, default_value_t = 4)]
        depth: u32,
    },
    /// Benchmark dictionary against plain compression on a synthetic corpus
    Bench {
        /// Corpus shape: metrics | api | listings
        #[arg(short, long, default_value = "metrics")]
        scenario: String,
        /// Number of messages to generate
        #[arg(short, long, default_value_t = 2000)]
        count: usize,
        /// Fixed random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Maximum dictionary size in bytes
        #[arg(long, default_value_t = dictwire_core::DEFAULT_MAX_SIZE)]
        max_size: usize,
        /// Zstd compression level (1-22)
        #[arg(long, default_value_t = dictwire_core::DEFAULT_LEVEL)]
        level: i32,
    },
    /// Report savings, break-even point, and per-size-bucket stats
    Analyze {
        /// Corpus shape: metrics | api | listings
        #[arg(short, long, default_value = "metrics")]
        scenario: String,
        /// Number of messages to generate
        #[arg(short, long, default_value_t = 2000)]
        count: usize,
        /// Fixed random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Maximum dictionary size in bytes
        #[arg(long, default_value_t = dictwire_core::DEFAULT_MAX_SIZE)]
        max_size: usize,
        /// Analyze listings of this directory instead of a synthetic corpus
        /// (one sample per subdirectory, plus the root)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn load_dictionary(path: &Option<PathBuf>) -> anyhow::Result<Option<Dictionary>> {
    match path {
        Some(path) => {
            let dict = Dictionary::load(path)
                .with_context(|| format!("loading dictionary {:?}", path))?;
            Ok(Some(dict))
        }
        None => Ok(None),
    }
}

/// Register every wire encoding this process can speak: zstd always, gzip
/// always, zstd-dict when a dictionary is given.
fn register_encodings(dict: Option<Dictionary>) -> anyhow::Result<()> {
    dictwire_core::register_default_codecs(dict)?;
    dictwire_core::register(std::sync::Arc::new(GzipCompressor::new()));
    Ok(())
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_train(
    samples: PathBuf,
    output: PathBuf,
    max_size: usize,
    id: Option<u32>,
) -> anyhow::Result<()> {
    let sample_count = std::fs::read_dir(&samples)
        .with_context(|| format!("reading sample directory {:?}", samples))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .count();

    let options = TrainOptions { max_size, id };
    let t0 = Instant::now();
    let dict = train_from_dir(&samples, &options)?;
    let elapsed = t0.elapsed();
    dict.save(&output)
        .with_context(|| format!("writing dictionary {:?}", output))?;

    eprintln!("  samples     : {}", sample_count);
    eprintln!("  dictionary  : {}", human_bytes(dict.len() as u64));
    eprintln!("  id          : 0x{:08x}", dict.id());
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    eprintln!("  written to  : {:?}", output);
    Ok(())
}

fn run_serve(
    root: PathBuf,
    addr: &str,
    dictionary: Option<PathBuf>,
    max_depth: u32,
) -> anyhow::Result<()> {
    let dict = load_dictionary(&dictionary)?;
    match &dict {
        Some(dict) => eprintln!(
            "dictionary loaded: {} (id 0x{:08x}), encodings: zstd, zstd-dict, gzip",
            human_bytes(dict.len() as u64),
            dict.id()
        ),
        None => eprintln!("no dictionary, encodings: zstd, gzip"),
    }
    register_encodings(dict)?;

    let listener =
        TcpListener::bind(addr).with_context(|| format!("binding to {addr}"))?;
    eprintln!("serving {:?} on {} (max depth {})", root, addr, max_depth);
    transport::serve(listener, ServerConfig { root, max_depth })
}

fn run_list(
    path: String,
    addr: &str,
    encoding: &str,
    dictionary: Option<PathBuf>,
    depth: u32,
) -> anyhow::Result<()> {
    register_encodings(load_dictionary(&dictionary)?)?;
    let encoding = if encoding == "none" { "" } else { encoding };

    let t0 = Instant::now();
    let bytes = transport::fetch(
        addr,
        &Request {
            encoding: encoding.to_string(),
            path,
            depth,
        },
    )?;
    let elapsed = t0.elapsed();

    let response: listing::ListResponse =
        serde_json::from_slice(&bytes).context("decoding listing JSON")?;
    for entry in &response.entries {
        if entry.is_dir {
            println!("  {:>10}  {}/", "-", entry.path);
        } else {
            println!("  {:>10}  {}", human_bytes(entry.size), entry.path);
        }
    }
    eprintln!("  entries     : {}", response.entries.len());
    eprintln!("  listing     : {}", human_bytes(bytes.len() as u64));
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_bench(
    scenario: &str,
    count: usize,
    seed: u64,
    max_size: usize,
    level: i32,
) -> anyhow::Result<()> {
    let corpus = scenarios::corpus(scenario, count, seed)?;
    let (training, eval) = corpus.split();
    let options = TrainOptions { max_size, id: None };

    let t0 = Instant::now();
    let dict = dictwire_core::train(training, &options)?;
    let train_elapsed = t0.elapsed();
    let dict_size = dict.len();

    let plain = dictwire_core::Codec::new(
        dictwire_core::CodecConfig::plain("zstd").level(level),
    )?;
    let dicted = dictwire_core::Codec::new(
        dictwire_core::CodecConfig::with_dictionary("zstd-dict", dict).level(level),
    )?;

    let original: u64 = eval.iter().map(|m| m.len() as u64).sum();

    let t0 = Instant::now();
    let mut plain_total = 0u64;
    for message in eval {
        plain_total += plain.compress(message)?.len() as u64;
    }
    let plain_elapsed = t0.elapsed();

    let t0 = Instant::now();
    let mut dict_total = 0u64;
    for message in eval {
        dict_total += dicted.compress(message)?.len() as u64;
    }
    let dict_elapsed = t0.elapsed();

    eprintln!("  scenario    : {} ({} messages evaluated)", scenario, eval.len());
    eprintln!(
        "  dictionary  : {} (trained on {} messages in {:.3}s)",
        human_bytes(dict_size as u64),
        training.len(),
        train_elapsed.as_secs_f64()
    );
    eprintln!("  original    : {}", human_bytes(original));
    eprintln!(
        "  plain zstd  : {} ({:.2}x) at {}/s",
        human_bytes(plain_total),
        original as f64 / plain_total as f64,
        human_bytes((original as f64 / plain_elapsed.as_secs_f64()) as u64)
    );
    eprintln!(
        "  zstd-dict   : {} ({:.2}x) at {}/s",
        human_bytes(dict_total),
        original as f64 / dict_total as f64,
        human_bytes((original as f64 / dict_elapsed.as_secs_f64()) as u64)
    );
    Ok(())
}

fn run_analyze(
    scenario: &str,
    count: usize,
    seed: u64,
    max_size: usize,
    dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let corpus = match &dir {
        Some(dir) => dictwire_analysis::Corpus::new(
            dir.display().to_string(),
            listing::response_samples(dir, 4)
                .with_context(|| format!("sampling listings under {:?}", dir))?,
        ),
        None => scenarios::corpus(scenario, count, seed)?,
    };
    let options = TrainOptions { max_size, id: None };
    let analyzer = Analyzer::for_corpus(&corpus, &options)?;
    let (_, eval) = corpus.split();
    let report = analyzer.run(eval)?;

    println!("=== Dictionary Savings: {} ===", corpus.name());
    println!();
    println!("  messages       : {}", report.messages);
    println!("  dictionary     : {}", human_bytes(report.dictionary_size as u64));
    println!("  original       : {}", human_bytes(report.original_total));
    println!("  gzip           : {}", human_bytes(report.gzip_total));
    println!("  plain zstd     : {}", human_bytes(report.plain_total));
    println!("  zstd-dict      : {}", human_bytes(report.dict_total));
    println!(
        "  savings        : {} ({:.1}% of plain, {:.1} B/message)",
        report.savings,
        (1.0 - report.ratio()) * 100.0,
        report.average_savings()
    );
    match report.break_even {
        Some(n) => println!("  break-even     : message {}", n),
        None => println!(
            "  break-even     : not reached in {} messages",
            report.messages
        ),
    }

    println!();
    println!(
        "  {:>12}  {:>8}  {:>12}  {:>12}  {:>7}",
        "bucket", "count", "plain", "dict", "ratio"
    );
    println!("  {}", "-".repeat(60));
    for row in &report.buckets {
        println!(
            "  {:>12}  {:>8}  {:>12}  {:>12}  {:>6.2}x",
            row.label,
            row.count,
            human_bytes(row.plain_total),
            human_bytes(row.dict_total),
            row.plain_total as f64 / row.dict_total.max(1) as f64
        );
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Train {
            samples,
            output,
            max_size,
            id,
        } => run_train(samples, output, max_size, id),
        Commands::Serve {
            root,
            addr,
            dictionary,
            max_depth,
        } => run_serve(root, &addr, dictionary, max_depth),
        Commands::List {
            path,
            addr,
            encoding,
            dictionary,
            depth,
        } => run_list(path, &addr, &encoding, dictionary, depth),
        Commands::Bench {
            scenario,
            count,
            seed,
            max_size,
            level,
        } => run_bench(&scenario, count, seed, max_size, level),
        Commands::Analyze {
            scenario,
            count,
            seed,
            max_size,
            dir,
        } => run_analyze(&scenario, count, seed, max_size, dir),
    }
}
