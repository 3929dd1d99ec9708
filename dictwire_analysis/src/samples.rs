//! Deterministic synthetic corpora for benchmarks and analysis runs.
//!
//! Each generator emits JSON messages that share their structure but differ
//! in values, which is exactly the shape dictionary training exploits. The
//! same `(count, seed)` pair always produces the same corpus.

use std::collections::BTreeMap;

use serde::Serialize;

/// A named set of messages with a fixed train/evaluate split.
#[derive(Debug, Clone)]
pub struct Corpus {
    name: String,
    samples: Vec<Vec<u8>>,
}

impl Corpus {
    pub fn new(name: impl Into<String>, samples: Vec<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            samples,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[Vec<u8>] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// First half for training, second half for evaluation, so savings are
    /// never measured on the messages the dictionary memorized.
    pub fn split(&self) -> (&[Vec<u8>], &[Vec<u8>]) {
        self.samples.split_at(self.samples.len() / 2)
    }
}

struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn pick<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[(self.next() % choices.len() as u64) as usize]
    }
}

// BTreeMap keeps serialized key order stable across runs.

#[derive(Serialize)]
struct MetricsPayload {
    schema: &'static str,
    host: String,
    region: &'static str,
    interval_secs: u64,
    gauges: BTreeMap<&'static str, f64>,
    counters: BTreeMap<&'static str, u64>,
}

/// Host-metrics submissions, a few hundred bytes each.
pub fn metrics_payloads(count: usize, seed: u64) -> Corpus {
    let mut rng = Lcg::new(seed);
    let samples = (0..count)
        .map(|_| {
            let mut gauges = BTreeMap::new();
            gauges.insert("cpu_user_pct", (rng.next() % 10_000) as f64 / 100.0);
            gauges.insert("cpu_system_pct", (rng.next() % 10_000) as f64 / 100.0);
            gauges.insert("load_avg_1m", (rng.next() % 3_200) as f64 / 100.0);
            gauges.insert("mem_used_pct", (rng.next() % 10_000) as f64 / 100.0);
            let mut counters = BTreeMap::new();
            counters.insert("disk_read_bytes", rng.next() % (1 << 30));
            counters.insert("disk_write_bytes", rng.next() % (1 << 30));
            counters.insert("net_rx_packets", rng.next() % 1_000_000);
            counters.insert("net_tx_packets", rng.next() % 1_000_000);
            let payload = MetricsPayload {
                schema: "metrics.v1",
                host: format!("node-{:04}.internal.example.com", rng.next() % 10_000),
                region: rng.pick(&["us-east-1", "us-west-2", "eu-central-1"]),
                interval_secs: 60,
                gauges,
                counters,
            };
            encode(&payload)
        })
        .collect();
    Corpus::new("metrics", samples)
}

#[derive(Serialize)]
struct ApiItem {
    id: String,
    kind: &'static str,
    created_at: String,
    attributes: BTreeMap<&'static str, String>,
}

#[derive(Serialize)]
struct ApiResponse {
    status: &'static str,
    request_id: String,
    items: Vec<ApiItem>,
    next_page: Option<String>,
}

/// Paginated REST-style responses, a few KiB each.
pub fn api_responses(count: usize, seed: u64) -> Corpus {
    let mut rng = Lcg::new(seed);
    let samples = (0..count)
        .map(|_| {
            let items = (0..3 + rng.next() % 8)
                .map(|_| {
                    let mut attributes = BTreeMap::new();
                    attributes.insert(
                        "owner",
                        format!("team-{}", rng.pick(&["ingest", "billing", "search"])),
                    );
                    attributes.insert("tier", rng.pick(&["standard", "premium"]).to_string());
                    attributes.insert("checksum", format!("{:016x}", rng.next()));
                    ApiItem {
                        id: format!("res-{:012x}", rng.next() & 0xffff_ffff_ffff),
                        kind: rng.pick(&["document", "image", "archive"]),
                        created_at: format!(
                            "2026-{:02}-{:02}T{:02}:{:02}:{:02}Z",
                            1 + rng.next() % 12,
                            1 + rng.next() % 28,
                            rng.next() % 24,
                            rng.next() % 60,
                            rng.next() % 60,
                        ),
                        attributes,
                    }
                })
                .collect();
            let response = ApiResponse {
                status: "ok",
                request_id: format!("req-{:016x}", rng.next()),
                items,
                next_page: if rng.next() % 4 == 0 {
                    None
                } else {
                    Some(format!("cursor-{:08x}", rng.next() & 0xffff_ffff))
                },
            };
            encode(&response)
        })
        .collect();
    Corpus::new("api", samples)
}

#[derive(Serialize)]
struct ListedFile {
    path: String,
    size: u64,
    mode: &'static str,
    modified: String,
}

#[derive(Serialize)]
struct Listing {
    root: String,
    entries: Vec<ListedFile>,
}

/// Directory-listing responses like the ones the listing service serves.
pub fn file_listings(count: usize, seed: u64) -> Corpus {
    let mut rng = Lcg::new(seed);
    let samples = (0..count)
        .map(|_| {
            let dir = rng.pick(&["var/log", "srv/data", "home/build", "opt/cache"]);
            let entries = (0..5 + rng.next() % 20)
                .map(|i| ListedFile {
                    path: format!(
                        "{dir}/{}-{:04}.{}",
                        rng.pick(&["report", "snapshot", "journal"]),
                        i,
                        rng.pick(&["log", "json", "dat"]),
                    ),
                    size: rng.next() % (64 << 20),
                    mode: rng.pick(&["-rw-r--r--", "-rw-------"]),
                    modified: format!(
                        "2026-{:02}-{:02}T{:02}:{:02}:00Z",
                        1 + rng.next() % 12,
                        1 + rng.next() % 28,
                        rng.next() % 24,
                        rng.next() % 60,
                    ),
                })
                .collect();
            let listing = Listing {
                root: format!("/{dir}"),
                entries,
            };
            encode(&listing)
        })
        .collect();
    Corpus::new("listings", samples)
}

fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    // Serialization of these fixed shapes cannot fail.
    serde_json::to_vec(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generators_are_deterministic() {
        for corpus in [
            metrics_payloads(20, 1),
            api_responses(20, 1),
            file_listings(20, 1),
        ] {
            let again = match corpus.name() {
                "metrics" => metrics_payloads(20, 1),
                "api" => api_responses(20, 1),
                _ => file_listings(20, 1),
            };
            assert_eq!(corpus.samples(), again.samples());
        }
    }

    #[test]
    fn samples_are_valid_json() {
        for sample in metrics_payloads(5, 3).samples() {
            serde_json::from_slice::<serde_json::Value>(sample).unwrap();
        }
    }

    #[test]
    fn split_never_overlaps() {
        let corpus = api_responses(21, 2);
        let (train, eval) = corpus.split();
        assert_eq!(train.len(), 10);
        assert_eq!(eval.len(), 11);
    }
}
