//! In-memory TTL cache for historical bar payloads.

use std::{
    collections::HashMap,
    ops::RangeInclusive,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;

use crate::Clock;

/// Local hours (exchange time) treated as the trading session.
pub const SESSION_HOURS: RangeInclusive<u32> = 9..=16;
pub const SESSION_TTL_SECS: i64 = 300;
pub const OFF_HOURS_TTL_SECS: i64 = 3600;

pub trait TtlCache: Send + Sync {
    /// Returns the payload stored under `key` unless its TTL has elapsed.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, fully replacing any previous entry.
    fn set(&self, key: &str, value: String, ttl: Duration);
}

/// Cache lifetime for data fetched at `now`: short while the exchange is in session,
/// longer otherwise.
pub fn market_hours_ttl(now: DateTime<Utc>, tz: Tz) -> Duration {
    if SESSION_HOURS.contains(&now.with_timezone(&tz).hour()) {
        Duration::seconds(SESSION_TTL_SECS)
    } else {
        Duration::seconds(OFF_HOURS_TTL_SECS)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: String,
    expires_at: DateTime<Utc>,
}

/// Process-lifetime cache. Expiry is read from the injected clock.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Number of stored entries, expired ones included until they are looked up.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TtlCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        match entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(entry.payload.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        if ttl <= Duration::zero() {
            return;
        }

        let expires_at = self.clock.now() + ttl;
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                key.to_string(),
                CacheEntry {
                    payload: value,
                    expires_at,
                },
            );
    }
}
