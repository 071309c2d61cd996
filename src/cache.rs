use std::env;
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;

use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::adapters::normalize_ttl;
use crate::codec::{format_duration, Storable};
use crate::commands::{Del, Get, Set};
use crate::config::{env_var, parse_number, parse_timeout};
use crate::frame::Frame;
use crate::registry::{Connection, Registry};
use crate::{Error, Result};

pub const DEFAULT_CACHE_CONNECTION: &str = "cache";

/// Sizing of the in-process hot set and the default lifetime of store-side entries.
#[derive(Clone, Debug, PartialEq)]
pub struct NearCacheConfig {
    /// Most keys kept in process.
    pub size: usize,
    /// How long a key stays valid in process.
    pub local_ttl: Duration,
    /// TTL of entries written to the store when `set` is not given one.
    pub default_ttl: Duration,
}

impl Default for NearCacheConfig {
    fn default() -> Self {
        NearCacheConfig {
            size: 10_000,
            local_ttl: Duration::from_secs(60),
            default_ttl: Duration::from_secs(3_600),
        }
    }
}

impl NearCacheConfig {
    /// Reads `REDIS_<NAME>_TINYLFU_SIZE` and `REDIS_<NAME>_TINYLFU_DURATION`.
    pub fn from_env(name: &str) -> Result<NearCacheConfig> {
        NearCacheConfig::from_lookup(name, |var| env::var(var).ok())
    }

    pub fn from_lookup(
        name: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<NearCacheConfig> {
        let mut config = NearCacheConfig::default();

        let size_var = env_var(name, "TINYLFU_SIZE");
        if let Some(size) = lookup(&size_var).filter(|v| !v.trim().is_empty()) {
            config.size = parse_number(&size_var, size.trim())?;
        }
        let duration_var = env_var(name, "TINYLFU_DURATION");
        if let Some(duration) = lookup(&duration_var).filter(|v| !v.trim().is_empty()) {
            config.local_ttl = parse_timeout(&duration_var, duration.trim())?;
        }

        Ok(config)
    }
}

struct Cached {
    wire: String,
    until: Instant,
}

/// Read-through cache for values kept on the string path.
///
/// Recently used keys are served from process memory until their local TTL runs out or they
/// are evicted by the LRU bound; everything else is read from the store and remembered.
pub struct NearCache {
    conn: Connection,
    local: Mutex<LruCache<String, Cached>>,
    local_ttl: Duration,
    default_ttl: Duration,
}

impl NearCache {
    pub fn new(conn: Connection, config: NearCacheConfig) -> Result<NearCache> {
        let size = NonZeroUsize::new(config.size).ok_or_else(|| {
            Error::InvalidArgument("near cache size must be positive".to_string())
        })?;

        Ok(NearCache {
            conn,
            local: Mutex::new(LruCache::new(size)),
            local_ttl: config.local_ttl,
            default_ttl: config.default_ttl,
        })
    }

    /// Builds the cache over the registry's connection `name`, sized from the environment.
    pub fn open(registry: &Registry, name: &str) -> Result<NearCache> {
        let conn = registry.connection(name)?.clone();
        let config = NearCacheConfig::from_env(name)?;
        info!(
            connection = name,
            size = config.size,
            duration = %format_duration(config.local_ttl),
            "near cache enabled"
        );
        NearCache::new(conn, config)
    }

    pub async fn get<T: Storable>(&self, key: &str) -> Result<Option<T>> {
        if let Some(wire) = self.local_get(key) {
            debug!(key, "near cache hit");
            return T::decode(&wire).map(Some);
        }

        let get = Get {
            key: self.conn.namer().qualify_one(key)?,
        };
        let wire = self.conn.execute(get, None).await?.into_string()?;
        match wire {
            Some(wire) => {
                let value = T::decode(&wire)?;
                self.local_put(key, wire);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Writes through to the store, with `ttl` or the default TTL, and keeps the value local.
    pub async fn set<T: Storable>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()> {
        let wire = value.encode()?;
        let set = Set {
            key: self.conn.namer().qualify_one(key)?,
            value: Bytes::from(wire.clone()),
            ttl: normalize_ttl(Some(ttl.unwrap_or(self.default_ttl)))?,
        };

        match self.conn.execute(set, None).await? {
            reply if reply.is_ok() => {
                self.local_put(key, wire);
                Ok(())
            }
            Frame::Error(msg) => Err(Error::WriteRejected(msg)),
            reply => Err(Error::WriteRejected(format!("unexpected reply {reply}"))),
        }
    }

    /// Drops the key locally and in the store. Returns whether the store held it.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.local.lock().pop(key);
        let del = Del {
            keys: vec![self.conn.namer().qualify_one(key)?],
        };

        match self.conn.execute(del, None).await?.into_result()? {
            Frame::Integer(n) => Ok(n > 0),
            reply => Err(Error::Transport(format!(
                "protocol error; unexpected reply {reply}"
            ))),
        }
    }

    fn local_get(&self, key: &str) -> Option<String> {
        let mut local = self.local.lock();
        let found = local
            .get(key)
            .map(|cached| (cached.until > Instant::now(), cached.wire.clone()));
        match found {
            Some((true, wire)) => Some(wire),
            Some((false, _)) => {
                local.pop(key);
                None
            }
            None => None,
        }
    }

    fn local_put(&self, key: &str, wire: String) {
        let cached = Cached {
            wire,
            until: Instant::now() + self.local_ttl,
        };
        self.local.lock().put(key.to_string(), cached);
    }
}

impl fmt::Debug for NearCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NearCache")
            .field("conn", &self.conn)
            .field("local", &self.local.lock().len())
            .field("local_ttl", &self.local_ttl)
            .finish()
    }
}
