//! TTL + LRU response cache keyed on normalized question text.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;

use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::CacheConfig;
use crate::ticket::SupportResponse;

/// One cached response plus the bookkeeping eviction needs.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Original question text, kept for popularity reporting since the map
    /// key is a digest.
    question: String,
    response: SupportResponse,
    created_at: Instant,
    last_accessed: Instant,
    hit_count: u64,
    lru_seq: u64,
}

/// Counters accumulated over the cache lifetime.
#[derive(Debug, Clone, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
    avg_hit_time_us: f64,
    avg_miss_time_us: f64,
}

impl Counters {
    fn record_hit(&mut self, elapsed_us: f64) {
        self.hits += 1;
        self.avg_hit_time_us += (elapsed_us - self.avg_hit_time_us) / self.hits as f64;
    }

    fn record_miss(&mut self, elapsed_us: f64) {
        self.misses += 1;
        self.avg_miss_time_us += (elapsed_us - self.avg_miss_time_us) / self.misses as f64;
    }
}

/// Snapshot returned by [`ResponseCache::stats`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub total_requests: u64,
    pub hit_rate: f64,
    pub len: usize,
    pub max_size: usize,
    pub utilization: f64,
    pub avg_hit_time_us: f64,
    pub avg_miss_time_us: f64,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    lru_counter: u64,
    counters: Counters,
}

/// Thread-safe response cache.
///
/// Lookups expire entries past their TTL on the spot; inserts evict the
/// least recently used entry once the cache is full, so the entry count
/// never exceeds `max_size`. All state, counters included, sits behind one
/// lock so snapshots are internally consistent.
pub struct ResponseCache {
    inner: Mutex<CacheInner>,
    config: CacheConfig,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                lru_counter: 0,
                counters: Counters::default(),
            }),
            config,
        }
    }

    /// Key derivation: case, spacing, and surrounding whitespace do not
    /// produce distinct entries.
    fn cache_key(question: &str) -> String {
        let normalized = question
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let digest = Sha256::digest(normalized.as_bytes());
        format!("{digest:x}")
    }

    /// Look up a cached response, expiring the entry if its TTL has passed.
    pub fn get(&self, question: &str) -> Option<SupportResponse> {
        let started = Instant::now();
        let key = Self::cache_key(question);
        let mut inner = self.inner.lock().expect("cache lock poisoned");

        let expired = match inner.entries.get(&key) {
            None => {
                let elapsed = started.elapsed().as_secs_f64() * 1e6;
                inner.counters.record_miss(elapsed);
                return None;
            }
            Some(entry) => entry.created_at.elapsed() >= self.config.ttl(),
        };

        if expired {
            inner.entries.remove(&key);
            inner.counters.expirations += 1;
            let elapsed = started.elapsed().as_secs_f64() * 1e6;
            inner.counters.record_miss(elapsed);
            debug!(key = %key, "cache entry expired on lookup");
            return None;
        }

        inner.lru_counter += 1;
        let seq = inner.lru_counter;
        let entry = inner.entries.get_mut(&key).expect("entry checked above");
        entry.hit_count += 1;
        entry.last_accessed = Instant::now();
        entry.lru_seq = seq;
        let response = entry.response.clone();
        let elapsed = started.elapsed().as_secs_f64() * 1e6;
        inner.counters.record_hit(elapsed);
        Some(response)
    }

    /// Insert or replace. Replacing an existing key never evicts.
    pub fn put(&self, question: &str, response: SupportResponse) {
        if self.config.max_size == 0 {
            return;
        }
        let key = Self::cache_key(question);
        let mut inner = self.inner.lock().expect("cache lock poisoned");

        if !inner.entries.contains_key(&key) {
            while inner.entries.len() >= self.config.max_size {
                let oldest = inner
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.lru_seq)
                    .map(|(k, _)| k.clone());
                let Some(oldest) = oldest else { break };
                inner.entries.remove(&oldest);
                inner.counters.evictions += 1;
                debug!(key = %oldest, "evicted least recently used entry");
            }
        }

        inner.lru_counter += 1;
        let seq = inner.lru_counter;
        let now = Instant::now();
        inner.entries.insert(
            key,
            CacheEntry {
                question: question.to_string(),
                response,
                created_at: now,
                last_accessed: now,
                hit_count: 0,
                lru_seq: seq,
            },
        );
    }

    /// Drop the entry for this question, if present.
    pub fn invalidate(&self, question: &str) -> bool {
        let key = Self::cache_key(question);
        self.inner
            .lock()
            .expect("cache lock poisoned")
            .entries
            .remove(&key)
            .is_some()
    }

    pub fn clear(&self) {
        self.inner
            .lock()
            .expect("cache lock poisoned")
            .entries
            .clear();
    }

    /// Non-expired presence check. Does not touch LRU order.
    pub fn contains(&self, question: &str) -> bool {
        let key = Self::cache_key(question);
        let inner = self.inner.lock().expect("cache lock poisoned");
        inner
            .entries
            .get(&key)
            .map(|e| e.created_at.elapsed() < self.config.ttl())
            .unwrap_or(false)
    }

    /// Remove every entry past its TTL. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let ttl = self.config.ttl();
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let before = inner.entries.len();
        inner.entries.retain(|_, e| e.created_at.elapsed() < ttl);
        let removed = before - inner.entries.len();
        inner.counters.expirations += removed as u64;
        if removed > 0 {
            debug!(removed, "expired entries cleaned up");
        }
        removed
    }

    /// Shed low-value entries: first everything stale with at most one hit,
    /// then the lowest-hit fifth if the cache is still over 80% full.
    pub fn optimize(&self) -> usize {
        let stale_after = self.config.stale_after();
        let mut inner = self.inner.lock().expect("cache lock poisoned");
        let before = inner.entries.len();

        inner
            .entries
            .retain(|_, e| !(e.last_accessed.elapsed() >= stale_after && e.hit_count <= 1));

        let threshold = (self.config.max_size as f64 * 0.8) as usize;
        if inner.entries.len() > threshold {
            let mut by_hits: Vec<(String, u64)> = inner
                .entries
                .iter()
                .map(|(k, e)| (k.clone(), e.hit_count))
                .collect();
            by_hits.sort_by_key(|(_, hits)| *hits);
            let shed = inner.entries.len() / 5;
            for (key, _) in by_hits.into_iter().take(shed) {
                inner.entries.remove(&key);
            }
        }

        let removed = before - inner.entries.len();
        inner.counters.evictions += removed as u64;
        if removed > 0 {
            info!(removed, remaining = inner.entries.len(), "cache optimized");
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("cache lock poisoned");
        let c = &inner.counters;
        let total = c.hits + c.misses;
        CacheStats {
            hits: c.hits,
            misses: c.misses,
            evictions: c.evictions,
            expirations: c.expirations,
            total_requests: total,
            hit_rate: if total == 0 {
                0.0
            } else {
                c.hits as f64 / total as f64
            },
            len: inner.entries.len(),
            max_size: self.config.max_size,
            utilization: if self.config.max_size == 0 {
                0.0
            } else {
                inner.entries.len() as f64 / self.config.max_size as f64
            },
            avg_hit_time_us: c.avg_hit_time_us,
            avg_miss_time_us: c.avg_miss_time_us,
        }
    }

    /// The most-hit cached questions, best first.
    pub fn popular_questions(&self, limit: usize) -> Vec<(String, u64)> {
        let inner = self.inner.lock().expect("cache lock poisoned");
        let mut ranked: Vec<(String, u64)> = inner
            .entries
            .values()
            .map(|e| (e.question.clone(), e.hit_count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(limit);
        ranked
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Periodic maintenance: expire on the cleanup cadence, optimize when
    /// utilization runs high. The loop holds only a weak reference and exits
    /// once the cache is dropped.
    pub fn spawn_maintenance(cache: &Arc<Self>) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(cache);
        let interval = cache.config.cleanup_interval();
        let high_water = cache.config.optimize_utilization;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else { break };
                cache.cleanup_expired();
                if cache.stats().utilization > high_water {
                    cache.optimize();
                }
            }
            debug!("cache maintenance loop stopped");
        })
    }
}
