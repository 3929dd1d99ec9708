/// Bucket boundaries keyed on the original (uncompressed) message size.
/// The last bucket is open-ended.
const BOUNDS: [usize; 4] = [1_000, 5_000, 10_000, 50_000];

const LABELS: [&str; 5] = ["0-1000", "1000-5000", "5000-10000", "10000-50000", "50000+"];

#[derive(Debug, Clone, Copy, Default)]
struct BucketStats {
    count: usize,
    plain_total: u64,
    dict_total: u64,
}

/// Per-size-class compression stats, for spotting where the dictionary pays
/// off (small structured messages) and where it does nothing (large blobs).
#[derive(Debug, Clone, Default)]
pub struct SizeBuckets {
    buckets: [BucketStats; 5],
}

/// One non-empty bucket in a [`SizeBuckets::report`].
#[derive(Debug, Clone)]
pub struct BucketRow {
    pub label: &'static str,
    pub count: usize,
    pub plain_total: u64,
    pub dict_total: u64,
}

impl BucketRow {
    /// Dictionary-to-plain size ratio, below 1.0 when the dictionary wins.
    pub fn ratio(&self) -> f64 {
        if self.plain_total == 0 {
            return 1.0;
        }
        self.dict_total as f64 / self.plain_total as f64
    }
}

impl SizeBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one message. `original_len` picks the bucket; the two
    /// compressed lengths accumulate inside it.
    pub fn record(&mut self, original_len: usize, plain_len: usize, dict_len: usize) {
        let idx = BOUNDS.iter().position(|&b| original_len < b).unwrap_or(4);
        let stats = &mut self.buckets[idx];
        stats.count += 1;
        stats.plain_total += plain_len as u64;
        stats.dict_total += dict_len as u64;
    }

    /// Non-empty buckets in ascending size order.
    pub fn report(&self) -> Vec<BucketRow> {
        self.buckets
            .iter()
            .zip(LABELS)
            .filter(|(stats, _)| stats.count > 0)
            .map(|(stats, label)| BucketRow {
                label,
                count: stats.count,
                plain_total: stats.plain_total,
                dict_total: stats.dict_total,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_half_open() {
        let mut buckets = SizeBuckets::new();
        buckets.record(999, 10, 5);
        buckets.record(1_000, 10, 5);
        buckets.record(49_999, 10, 5);
        buckets.record(50_000, 10, 5);
        let rows = buckets.report();
        let labels: Vec<&str> = rows.iter().map(|r| r.label).collect();
        assert_eq!(labels, ["0-1000", "1000-5000", "10000-50000", "50000+"]);
        assert!(rows.iter().all(|r| r.count == 1));
    }

    #[test]
    fn empty_buckets_are_omitted() {
        let mut buckets = SizeBuckets::new();
        buckets.record(10, 100, 40);
        buckets.record(20, 100, 40);
        let rows = buckets.report();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "0-1000");
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].plain_total, 200);
        assert_eq!(rows[0].dict_total, 80);
    }

    #[test]
    fn ratio_handles_zero_plain_total() {
        let row = BucketRow {
            label: "0-1000",
            count: 1,
            plain_total: 0,
            dict_total: 0,
        };
        assert_eq!(row.ratio(), 1.0);
    }
}
