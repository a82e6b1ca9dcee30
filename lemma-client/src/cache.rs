use crate::deduplication::{Flight, FlightGuard, InFlight};
use crate::error::{ConfigError, Error};
use crate::retry::LemmaLoader;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Outcome of resolving one word: a lemma, `None` when the word has no
/// canonical form, or an error from a bounded retry policy.
pub type Resolution = Result<Option<String>, Error>;

#[derive(Debug)]
struct Slot {
    lemma: Option<String>,
    last_used: u64,
}

/// Entries ordered by recency. Every access stamps the entry with a fresh
/// tick, so the smallest tick in `recency` is always the LRU entry.
#[derive(Debug)]
struct LruStore {
    entries: HashMap<String, Slot>,
    recency: BTreeMap<u64, String>,
    tick: u64,
    capacity: usize,
}

impl LruStore {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            tick: 0,
            capacity,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn get(&mut self, word: &str) -> Option<Option<String>> {
        let tick = self.next_tick();
        let slot = self.entries.get_mut(word)?;
        self.recency.remove(&slot.last_used);
        slot.last_used = tick;
        self.recency.insert(tick, word.to_string());
        Some(slot.lemma.clone())
    }

    fn peek(&self, word: &str) -> Option<&Option<String>> {
        self.entries.get(word).map(|slot| &slot.lemma)
    }

    /// Stores `lemma` and returns the word evicted to make room, if any.
    fn insert(&mut self, word: String, lemma: Option<String>) -> Option<String> {
        let tick = self.next_tick();
        if let Some(previous) = self.entries.insert(
            word.clone(),
            Slot {
                lemma,
                last_used: tick,
            },
        ) {
            self.recency.remove(&previous.last_used);
        }
        self.recency.insert(tick, word);

        if self.entries.len() > self.capacity {
            let (_, oldest) = self.recency.pop_first()?;
            self.entries.remove(&oldest);
            return Some(oldest);
        }
        None
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    evictions: AtomicU64,
}

/// Fixed-capacity word → lemma cache with single-flight loading.
///
/// A miss runs the [`LemmaLoader`] for that word exactly once, however many
/// callers ask for it concurrently; the others wait for the same result.
/// The store lock is never held while a load runs, so loads for different
/// words proceed in parallel.
pub struct LemmaCache {
    store: Mutex<LruStore>,
    in_flight: InFlight,
    loader: LemmaLoader,
    capacity: usize,
    counters: Counters,
}

impl LemmaCache {
    pub fn new(capacity: usize, loader: LemmaLoader) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCacheCapacity(0));
        }

        Ok(Self {
            store: Mutex::new(LruStore::new(capacity)),
            in_flight: InFlight::default(),
            loader,
            capacity,
            counters: Counters::default(),
        })
    }

    fn lock_store(&self) -> MutexGuard<'_, LruStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve `word`, loading it if necessary. Under the default retry
    /// policy this never returns an error; it waits instead.
    pub async fn get(&self, word: &str) -> Resolution {
        let mut counted_miss = false;
        loop {
            let flight = {
                let mut store = self.lock_store();
                if let Some(lemma) = store.get(word) {
                    if !counted_miss {
                        self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    }
                    log::trace!("Cache hit for word '{}'", word);
                    return Ok(lemma);
                }
                self.in_flight.join(word)
            };

            if !counted_miss {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                counted_miss = true;
            }

            match flight {
                Flight::Leader => return self.lead(word).await,
                Flight::Waiter(rx) => match rx.await {
                    Ok(resolution) => return resolution,
                    Err(_) => {
                        log::debug!("Load for word '{}' was abandoned, taking over", word);
                    }
                },
            }
        }
    }

    async fn lead(&self, word: &str) -> Resolution {
        let guard = FlightGuard::new(&self.in_flight, word);
        log::debug!("Cache miss for word '{}', loading", word);
        self.counters.loads.fetch_add(1, Ordering::Relaxed);

        let resolution = self.loader.load(word).await;

        let waiters = {
            let mut store = self.lock_store();
            if let Ok(lemma) = &resolution {
                if let Some(evicted) = store.insert(word.to_string(), lemma.clone()) {
                    self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                    log::debug!("Evicted word '{}' from cache", evicted);
                }
            }
            self.in_flight.complete(word)
        };
        guard.disarm();

        for waiter in waiters {
            let _ = waiter.send(resolution.clone());
        }
        resolution
    }

    /// Whether `word` is cached, without refreshing its recency.
    pub fn contains(&self, word: &str) -> bool {
        self.lock_store().peek(word).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock_store().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.lock_store().clear();
        log::info!("Cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let total_entries = self.len();
        CacheStats {
            total_entries,
            max_entries: self.capacity,
            in_flight: self.in_flight.len(),
            waiting: self.in_flight.waiters(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub max_entries: usize,
    pub in_flight: usize,
    pub waiting: usize,
    pub hits: u64,
    pub misses: u64,
    pub loads: u64,
    pub evictions: u64,
}

/// Thread-safe wrapper for the cache
pub type SharedLemmaCache = Arc<LemmaCache>;
