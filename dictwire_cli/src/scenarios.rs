use dictwire_analysis::{api_responses, file_listings, metrics_payloads, Corpus};

/// Named synthetic corpora for `bench` and `analyze`.
pub fn corpus(name: &str, count: usize, seed: u64) -> anyhow::Result<Corpus> {
    match name {
        "metrics" => Ok(metrics_payloads(count, seed)),
        "api" => Ok(api_responses(count, seed)),
        "listings" => Ok(file_listings(count, seed)),
        other => anyhow::bail!(
            "unknown scenario '{}'. Valid options: metrics, api, listings",
            other
        ),
    }
}
