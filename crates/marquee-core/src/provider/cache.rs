use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::hash::Hasher;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, trace};
use twox_hash::XxHash64;

/// SQLite store for raw provider responses, keyed by request URL.
pub struct ResponseCache {
    conn: Mutex<Connection>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn open(path: &str, ttl: Duration) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = ResponseCache {
            conn: Mutex::new(conn),
            ttl,
        };
        cache.configure_pragmas()?;
        cache.migrate_schema()?;
        debug!("Using '{}' for response cache", path);
        Ok(cache)
    }

    pub fn open_in_memory(ttl: Duration) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = ResponseCache {
            conn: Mutex::new(conn),
            ttl,
        };
        cache.configure_pragmas()?;
        cache.migrate_schema()?;
        Ok(cache)
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn configure_pragmas(&self) -> Result<()> {
        self.connection().execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    fn migrate_schema(&self) -> Result<()> {
        self.connection().execute_batch(
            "CREATE TABLE IF NOT EXISTS response_cache (
                 key        TEXT PRIMARY KEY,
                 body       TEXT NOT NULL,
                 stored_at  INTEGER NOT NULL
             );",
        )?;
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn key_for(url: &str) -> String {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(url.as_bytes());
        format!("{:016x}", hasher.finish())
    }

    /// Returns the cached body for `url` if it is younger than the TTL.
    pub fn get(&self, url: &str) -> Result<Option<String>> {
        if !self.is_enabled() {
            return Ok(None);
        }
        let oldest = Utc::now().timestamp() - self.ttl.as_secs() as i64;
        let body = self
            .connection()
            .query_row(
                "SELECT body FROM response_cache WHERE key = ?1 AND stored_at > ?2",
                params![Self::key_for(url), oldest],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        trace!(url = url, hit = body.is_some(), "Response cache lookup");
        Ok(body)
    }

    pub fn put(&self, url: &str, body: &str) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        self.connection().execute(
            "INSERT OR REPLACE INTO response_cache (key, body, stored_at) VALUES (?1, ?2, ?3)",
            params![Self::key_for(url), body, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    pub fn count_keys(&self) -> Result<usize> {
        let count: i64 =
            self.connection()
                .query_row("SELECT COUNT(*) FROM response_cache", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn purge_expired(&self) -> Result<usize> {
        let oldest = Utc::now().timestamp() - self.ttl.as_secs() as i64;
        let removed = self.connection().execute(
            "DELETE FROM response_cache WHERE stored_at <= ?1",
            params![oldest],
        )?;
        debug!("Purged {} expired responses", removed);
        Ok(removed)
    }

    pub fn clear_all(&self) -> Result<usize> {
        let removed = self.connection().execute("DELETE FROM response_cache", [])?;
        info!("Response cache cleared");
        Ok(removed)
    }

    #[cfg(test)]
    fn backdate(&self, url: &str, secs: i64) -> Result<()> {
        self.connection().execute(
            "UPDATE response_cache SET stored_at = stored_at - ?1 WHERE key = ?2",
            params![secs, Self::key_for(url)],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(86_400);

    #[test]
    fn test_put_then_get() {
        let cache = ResponseCache::open_in_memory(DAY).unwrap();
        assert_eq!(cache.get("https://x/search?q=a").unwrap(), None);
        cache.put("https://x/search?q=a", "{\"results\":[]}").unwrap();
        assert_eq!(
            cache.get("https://x/search?q=a").unwrap().as_deref(),
            Some("{\"results\":[]}")
        );
        assert_eq!(cache.count_keys().unwrap(), 1);
    }

    #[test]
    fn test_put_replaces_existing() {
        let cache = ResponseCache::open_in_memory(DAY).unwrap();
        cache.put("u", "old").unwrap();
        cache.put("u", "new").unwrap();
        assert_eq!(cache.get("u").unwrap().as_deref(), Some("new"));
        assert_eq!(cache.count_keys().unwrap(), 1);
    }

    #[test]
    fn test_expired_entries_are_not_returned() {
        let cache = ResponseCache::open_in_memory(DAY).unwrap();
        cache.put("u", "body").unwrap();
        cache.backdate("u", 2 * 86_400).unwrap();
        assert_eq!(cache.get("u").unwrap(), None, "stale entry must be a miss");

        cache.put("fresh", "body").unwrap();
        assert_eq!(cache.purge_expired().unwrap(), 1);
        assert_eq!(cache.count_keys().unwrap(), 1);
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let cache = ResponseCache::open_in_memory(Duration::ZERO).unwrap();
        cache.put("u", "body").unwrap();
        assert_eq!(cache.get("u").unwrap(), None);
        assert_eq!(cache.count_keys().unwrap(), 0);
    }

    #[test]
    fn test_clear_all() {
        let cache = ResponseCache::open_in_memory(DAY).unwrap();
        cache.put("a", "1").unwrap();
        cache.put("b", "2").unwrap();
        assert_eq!(cache.clear_all().unwrap(), 2);
        assert_eq!(cache.count_keys().unwrap(), 0);
    }

    #[test]
    fn test_key_is_stable() {
        assert_eq!(ResponseCache::key_for("abc"), ResponseCache::key_for("abc"));
        assert_ne!(ResponseCache::key_for("abc"), ResponseCache::key_for("abd"));
        assert_eq!(ResponseCache::key_for("abc").len(), 16);
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let path = path.to_string_lossy().into_owned();
        {
            let cache = ResponseCache::open(&path, DAY).unwrap();
            cache.put("u", "body").unwrap();
        }
        let reopened = ResponseCache::open(&path, DAY).unwrap();
        assert_eq!(reopened.get("u").unwrap().as_deref(), Some("body"));
    }
}
