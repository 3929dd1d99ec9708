/// Running account of what dictionary compression has saved.
///
/// Savings are signed and never clamped: a message the dictionary makes
/// larger pushes the cumulative total down. Break-even is the first message
/// index (1-based) at which cumulative savings cover the dictionary size,
/// and it is sticky. Savings dipping back below the line later does not
/// unset it, so recording order matters.
#[derive(Debug, Clone)]
pub struct SavingsLedger {
    dictionary_size: usize,
    messages: usize,
    plain_total: u64,
    dict_total: u64,
    savings: i64,
    break_even: Option<usize>,
}

impl SavingsLedger {
    pub fn new(dictionary_size: usize) -> Self {
        Self {
            dictionary_size,
            messages: 0,
            plain_total: 0,
            dict_total: 0,
            savings: 0,
            break_even: None,
        }
    }

    /// Record one message's compressed size under both codecs.
    pub fn record(&mut self, plain_len: usize, dict_len: usize) {
        self.messages += 1;
        self.plain_total += plain_len as u64;
        self.dict_total += dict_len as u64;
        self.savings += plain_len as i64 - dict_len as i64;
        if self.break_even.is_none() && self.savings >= self.dictionary_size as i64 {
            self.break_even = Some(self.messages);
        }
    }

    pub fn dictionary_size(&self) -> usize {
        self.dictionary_size
    }

    pub fn messages(&self) -> usize {
        self.messages
    }

    pub fn plain_total(&self) -> u64 {
        self.plain_total
    }

    pub fn dict_total(&self) -> u64 {
        self.dict_total
    }

    /// Cumulative signed savings in bytes.
    pub fn savings(&self) -> i64 {
        self.savings
    }

    /// 1-based index of the message that paid off the dictionary, if any
    /// has yet.
    pub fn break_even(&self) -> Option<usize> {
        self.break_even
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_accumulate() {
        let mut ledger = SavingsLedger::new(50);
        ledger.record(100, 60);
        ledger.record(200, 120);
        assert_eq!(ledger.messages(), 2);
        assert_eq!(ledger.plain_total(), 300);
        assert_eq!(ledger.dict_total(), 180);
        assert_eq!(ledger.savings(), 120);
    }

    #[test]
    fn totals_never_decrease() {
        let mut ledger = SavingsLedger::new(500);
        let mut prev = (0u64, 0u64);
        for (plain, dict) in [(100, 40), (5, 80), (0, 0), (1000, 300)] {
            ledger.record(plain, dict);
            assert!(ledger.plain_total() >= prev.0);
            assert!(ledger.dict_total() >= prev.1);
            prev = (ledger.plain_total(), ledger.dict_total());
        }
    }

    #[test]
    fn negative_savings_count_against() {
        let mut ledger = SavingsLedger::new(1000);
        ledger.record(10, 50);
        assert_eq!(ledger.savings(), -40);
        assert_eq!(ledger.break_even(), None);
    }

    #[test]
    fn break_even_depends_on_order() {
        // Small losing message first delays break-even by one.
        let mut forward = SavingsLedger::new(100);
        forward.record(10, 15);
        forward.record(300, 100);
        assert_eq!(forward.break_even(), Some(2));

        let mut reversed = SavingsLedger::new(100);
        reversed.record(300, 100);
        reversed.record(10, 15);
        assert_eq!(reversed.break_even(), Some(1));
    }

    #[test]
    fn break_even_may_never_arrive() {
        let mut ledger = SavingsLedger::new(1 << 20);
        for _ in 0..1000 {
            ledger.record(100, 90);
        }
        assert_eq!(ledger.break_even(), None);
    }

    #[test]
    fn break_even_is_sticky() {
        let mut ledger = SavingsLedger::new(100);
        ledger.record(300, 100);
        assert_eq!(ledger.break_even(), Some(1));
        // A big losing message drops savings below the line again.
        ledger.record(10, 500);
        assert!(ledger.savings() < 100);
        assert_eq!(ledger.break_even(), Some(1));
    }

    #[test]
    fn zero_size_dictionary_breaks_even_immediately() {
        let mut ledger = SavingsLedger::new(0);
        ledger.record(10, 10);
        assert_eq!(ledger.break_even(), Some(1));
    }
}
