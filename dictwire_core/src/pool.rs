use std::sync::Mutex;

/// Engines kept idle beyond this count are dropped on release.
const MAX_IDLE: usize = 8;

/// A lock-guarded free list of reusable engines.
///
/// `acquire` returning `None` is not an error: callers construct a fresh
/// engine on a miss and hand it back afterwards, so the pool warms up under
/// load and stays empty when idle.
pub struct Pool<T> {
    free: Mutex<Vec<T>>,
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }

    /// Take an idle engine if one is available.
    pub fn acquire(&self) -> Option<T> {
        match self.free.lock() {
            Ok(mut free) => free.pop(),
            Err(_) => None,
        }
    }

    /// Return an engine to the free list. Engines beyond the idle cap are
    /// dropped instead of retained.
    pub fn release(&self, engine: T) {
        if let Ok(mut free) = self.free.lock() {
            if free.len() < MAX_IDLE {
                free.push(engine);
            }
        }
    }

    #[cfg(test)]
    fn idle(&self) -> usize {
        self.free.lock().map(|f| f.len()).unwrap_or(0)
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pool_misses() {
        let pool: Pool<u32> = Pool::new();
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn release_then_acquire_reuses() {
        let pool = Pool::new();
        pool.release(42u32);
        assert_eq!(pool.acquire(), Some(42));
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn idle_count_is_capped() {
        let pool = Pool::new();
        for i in 0..MAX_IDLE + 5 {
            pool.release(i);
        }
        assert_eq!(pool.idle(), MAX_IDLE);
    }
}
