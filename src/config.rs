use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use redis::{ConnectionAddr, ConnectionInfo, IntoConnectionInfo, RedisConnectionInfo};

use crate::codec::{format_duration, parse_duration};
use crate::hints::DEFAULT_CONNECTION;
use crate::{Error, Result};

const DEFAULT_ADDRESS: &str = "localhost:6379";
const DEFAULT_PORT: u16 = 6379;

/// Connection parameters for one named connection.
///
/// The typed layer itself only reads `key_prefix`; everything else is handed to the client.
#[derive(Clone, PartialEq)]
pub struct ConnectionConfig {
    pub name: String,
    /// `host:port` pairs, or full `redis://` URLs. Only the first is dialed.
    pub addresses: Vec<String>,
    pub username: String,
    pub password: String,
    pub db: i64,
    pub dial_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// Sentinel master name, if the addresses point at sentinels.
    pub master_name: Option<String>,
    pub pool_size: usize,
    pub max_retries: usize,
    pub key_prefix: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            name: DEFAULT_CONNECTION.to_string(),
            addresses: vec![DEFAULT_ADDRESS.to_string()],
            username: String::new(),
            password: String::new(),
            db: 0,
            dial_timeout: Duration::from_secs(1),
            read_timeout: Duration::from_secs(3),
            write_timeout: Duration::from_secs(3),
            master_name: None,
            pool_size: 10,
            max_retries: 3,
            key_prefix: String::new(),
        }
    }
}

impl ConnectionConfig {
    /// Reads the connection named `name` from the process environment.
    ///
    /// The default connection reads `REDIS_URL`, `REDIS_DB` and so on; any other connection
    /// reads `REDIS_<NAME>_URL`, `REDIS_<NAME>_DB`, ...
    pub fn from_env(name: &str) -> Result<ConnectionConfig> {
        ConnectionConfig::from_lookup(name, |var| env::var(var).ok())
    }

    pub fn from_lookup(
        name: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ConnectionConfig> {
        let var = |suffix: &str| {
            lookup(&env_var(name, suffix))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = ConnectionConfig {
            name: name.to_string(),
            ..ConnectionConfig::default()
        };

        if let Some(url) = var("URL") {
            config.addresses = url
                .split(';')
                .map(str::trim)
                .filter(|address| !address.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(auth) = var("BASIC_AUTH") {
            let (username, password) = auth.split_once(':').unwrap_or((auth.as_str(), ""));
            config.username = username.to_string();
            config.password = password.to_string();
        }
        if let Some(db) = var("DB") {
            config.db = parse_number(&env_var(name, "DB"), &db)?;
        }
        if let Some(timeout) = var("DIAL_TIMEOUT") {
            config.dial_timeout = parse_timeout(&env_var(name, "DIAL_TIMEOUT"), &timeout)?;
        }
        if let Some(timeout) = var("READ_TIMEOUT") {
            config.read_timeout = parse_timeout(&env_var(name, "READ_TIMEOUT"), &timeout)?;
        }
        if let Some(timeout) = var("WRITE_TIMEOUT") {
            config.write_timeout = parse_timeout(&env_var(name, "WRITE_TIMEOUT"), &timeout)?;
        }
        config.master_name = var("MASTER_NAME");
        if let Some(size) = var("POOL_SIZE") {
            config.pool_size = parse_number(&env_var(name, "POOL_SIZE"), &size)?;
        }
        if let Some(retries) = var("MAX_RETRIES") {
            config.max_retries = parse_number(&env_var(name, "MAX_RETRIES"), &retries)?;
        }

        config.key_prefix = var("KEY_PREFIX")
            .or_else(|| lookup("APP_NAME").map(|app| url_safe(&app)))
            .unwrap_or_default();
        if config.key_prefix.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "{} must be set",
                env_var(name, "KEY_PREFIX")
            )));
        }

        Ok(config)
    }

    /// What the `redis` client dials. A full URL in `addresses` is used as it is; a
    /// `host:port` pair is combined with the credentials and database of this config.
    pub fn connection_info(&self) -> Result<ConnectionInfo> {
        let address = self.addresses.first().ok_or_else(|| {
            Error::InvalidArgument(format!("connection {:?} has no address", self.name))
        })?;
        if address.contains("://") {
            return address
                .as_str()
                .into_connection_info()
                .map_err(|e| Error::InvalidArgument(format!("{address}: {e}")));
        }

        let (host, port) = match address.rsplit_once(':') {
            Some((host, port)) => (host, parse_number(address, port)?),
            None => (address.as_str(), DEFAULT_PORT),
        };
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(Error::InvalidArgument(format!("{address:?} has no host")));
        }

        Ok(ConnectionInfo {
            addr: ConnectionAddr::Tcp(host.to_string(), port),
            redis: RedisConnectionInfo {
                db: self.db,
                username: Some(self.username.clone()).filter(|user| !user.is_empty()),
                password: Some(self.password.clone()).filter(|pass| !pass.is_empty()),
                ..RedisConnectionInfo::default()
            },
        })
    }

    /// A one-line description for logs. Never includes the password.
    pub fn summary(&self) -> String {
        format!(
            "addresses={} user={:?} db={} dial_timeout={} read_timeout={} write_timeout={} \
             master={:?} pool_size={} max_retries={} key_prefix={}",
            self.addresses.join(";"),
            self.username,
            self.db,
            format_duration(self.dial_timeout),
            format_duration(self.read_timeout),
            format_duration(self.write_timeout),
            self.master_name.as_deref().unwrap_or(""),
            self.pool_size,
            self.max_retries,
            self.key_prefix,
        )
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionConfig {{ name: {:?}, {} }}", self.name, self.summary())
    }
}

/// `REDIS_<SUFFIX>` for the default connection, `REDIS_<NAME>_<SUFFIX>` otherwise.
pub(crate) fn env_var(name: &str, suffix: &str) -> String {
    if name == DEFAULT_CONNECTION {
        format!("REDIS_{suffix}")
    } else {
        format!("REDIS_{}_{suffix}", name.to_uppercase())
    }
}

pub(crate) fn parse_number<T: FromStr>(var: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::InvalidArgument(format!("{var}={value:?}: {e}")))
}

pub(crate) fn parse_timeout(var: &str, value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|e| Error::InvalidArgument(format!("{var}: {e}")))
}

/// Lowercase, with every run of characters outside `[a-z0-9]` collapsed to one `-`.
fn url_safe(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults() {
        let config =
            ConnectionConfig::from_lookup("default", lookup(&[("REDIS_KEY_PREFIX", "app")]))
                .unwrap();

        assert_eq!(config.addresses, vec!["localhost:6379"]);
        assert_eq!(config.db, 0);
        assert_eq!(config.dial_timeout, Duration::from_secs(1));
        assert_eq!(config.read_timeout, Duration::from_secs(3));
        assert_eq!(config.write_timeout, Duration::from_secs(3));
        assert_eq!(config.pool_size, 10);
        assert_eq!(config.max_retries, 3);
        let info = config.connection_info().unwrap();
        assert!(matches!(info.addr, ConnectionAddr::Tcp(ref host, 6379) if host == "localhost"));
        assert_eq!(info.redis.db, 0);
        assert_eq!(info.redis.username, None);
        assert_eq!(info.redis.password, None);
    }

    #[test]
    fn named_connection() {
        let config = ConnectionConfig::from_lookup(
            "cache",
            lookup(&[
                ("REDIS_CACHE_URL", "10.0.0.1:6380;10.0.0.2:6380"),
                ("REDIS_CACHE_BASIC_AUTH", "admin:s3cret"),
                ("REDIS_CACHE_DB", "2"),
                ("REDIS_CACHE_READ_TIMEOUT", "500ms"),
                ("REDIS_CACHE_MASTER_NAME", "mymaster"),
                ("REDIS_CACHE_KEY_PREFIX", "svc"),
                ("REDIS_DB", "5"),
            ]),
        )
        .unwrap();

        assert_eq!(config.name, "cache");
        assert_eq!(config.addresses.len(), 2);
        assert_eq!(config.db, 2);
        assert_eq!(config.read_timeout, Duration::from_millis(500));
        assert_eq!(config.master_name.as_deref(), Some("mymaster"));
        let info = config.connection_info().unwrap();
        assert!(matches!(info.addr, ConnectionAddr::Tcp(ref host, 6380) if host == "10.0.0.1"));
        assert_eq!(info.redis.db, 2);
        assert_eq!(info.redis.username.as_deref(), Some("admin"));
        assert_eq!(info.redis.password.as_deref(), Some("s3cret"));
        assert!(!config.summary().contains("s3cret"));
        assert!(!format!("{config:?}").contains("s3cret"));
    }

    #[test]
    fn credentials_are_passed_verbatim() {
        let config = ConnectionConfig {
            addresses: vec!["cache.internal".to_string()],
            username: "svc".to_string(),
            password: "p@ss:w/rd".to_string(),
            key_prefix: "app".to_string(),
            ..ConnectionConfig::default()
        };

        let info = config.connection_info().unwrap();
        assert!(
            matches!(info.addr, ConnectionAddr::Tcp(ref host, 6379) if host == "cache.internal")
        );
        assert_eq!(info.redis.password.as_deref(), Some("p@ss:w/rd"));
    }

    #[test]
    fn urls_and_bad_addresses() {
        let config = ConnectionConfig {
            addresses: vec!["redis://:pw@10.0.0.9:7000/3".to_string()],
            ..ConnectionConfig::default()
        };
        let info = config.connection_info().unwrap();
        assert!(matches!(info.addr, ConnectionAddr::Tcp(ref host, 7000) if host == "10.0.0.9"));
        assert_eq!(info.redis.db, 3);
        assert_eq!(info.redis.password.as_deref(), Some("pw"));

        for address in ["localhost:port", ":6379"] {
            let config = ConnectionConfig {
                addresses: vec![address.to_string()],
                ..ConnectionConfig::default()
            };
            assert!(matches!(
                config.connection_info(),
                Err(Error::InvalidArgument(_))
            ));
        }

        let config = ConnectionConfig {
            addresses: vec![],
            ..ConnectionConfig::default()
        };
        assert!(matches!(
            config.connection_info(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn prefix_falls_back_to_app_name() {
        let config =
            ConnectionConfig::from_lookup("default", lookup(&[("APP_NAME", "My Great App!")]))
                .unwrap();
        assert_eq!(config.key_prefix, "my-great-app");
    }

    #[test]
    fn missing_prefix_is_rejected() {
        let res = ConnectionConfig::from_lookup("default", lookup(&[]));
        assert!(matches!(res, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let res = ConnectionConfig::from_lookup(
            "default",
            lookup(&[("REDIS_KEY_PREFIX", "app"), ("REDIS_DB", "one")]),
        );
        assert!(matches!(res, Err(Error::InvalidArgument(_))));

        let res = ConnectionConfig::from_lookup(
            "default",
            lookup(&[("REDIS_KEY_PREFIX", "app"), ("REDIS_DIAL_TIMEOUT", "soon")]),
        );
        assert!(matches!(res, Err(Error::InvalidArgument(_))));
    }
}
