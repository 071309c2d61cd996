use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::adapters::{hash, sequence, sorted_set, string};
use crate::codec::Storable;
use crate::hints::Hints;
use crate::kind::{classify, classify_write, Kind};
use crate::ranking::RankingBoard;
use crate::registry::Registry;
use crate::{Error, Result};

/// The result of a read: one value for one key, or every requested key for many.
#[derive(Clone, Debug, PartialEq)]
pub enum Fetched<T> {
    One { key: String, value: Option<T> },
    Many(HashMap<String, Option<T>>),
}

impl<T> Fetched<T> {
    /// The value of a single-key read.
    pub fn into_one(self) -> Result<Option<T>> {
        match self {
            Fetched::One { value, .. } => Ok(value),
            Fetched::Many(values) => Err(Error::InvalidArgument(format!(
                "expected one key, fetched {}",
                values.len()
            ))),
        }
    }

    /// Every requested key with its value; a single-key read becomes a one-entry map.
    pub fn into_many(self) -> HashMap<String, Option<T>> {
        match self {
            Fetched::One { key, value } => HashMap::from([(key, value)]),
            Fetched::Many(values) => values,
        }
    }
}

/// Typed `get`, `set` and `mset` over the connections of a [`Registry`].
///
/// The structure a value lives in is picked from its type's [`Shape`](crate::kind::Shape) and
/// the `kind` hint. Callers must read a key with the kind they wrote it with.
#[derive(Clone, Debug)]
pub struct Accessor {
    registry: Registry,
}

impl Accessor {
    pub fn new(registry: Registry) -> Accessor {
        Accessor { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[instrument(skip_all, fields(keys = keys.len(), connection = hints.connection_or_default()))]
    pub async fn get<T: Storable, S: AsRef<str>>(
        &self,
        hints: &Hints,
        keys: &[S],
    ) -> Result<Fetched<T>> {
        if keys.is_empty() {
            return Err(Error::InvalidArgument("keys is empty".to_string()));
        }
        let conn = self.registry.resolve(hints)?;
        let kind = classify(T::SHAPE, hints.kind);
        debug!(%kind, "dispatching read");

        if let [key] = keys {
            let key = key.as_ref();
            let value = match kind {
                Kind::String => string::get_one(conn, hints, key).await?,
                Kind::Hash => hash::get_one(conn, hints, key).await?,
                Kind::List | Kind::Set => sequence::get_one(conn, hints, kind, key).await?,
                Kind::SortedSet => sorted_set::get_one(conn, hints, key).await?,
            };
            return Ok(Fetched::One {
                key: key.to_string(),
                value,
            });
        }

        let keys: Vec<String> = keys.iter().map(|key| key.as_ref().to_string()).collect();
        let values = match kind {
            Kind::String => string::get_many(conn, hints, &keys).await?,
            Kind::Hash => hash::get_many(conn, hints, &keys).await?,
            Kind::List | Kind::Set => sequence::get_many(conn, hints, kind, &keys).await?,
            Kind::SortedSet => sorted_set::get_many(conn, hints, &keys).await?,
        };
        Ok(Fetched::Many(values))
    }

    /// Reads a single key.
    pub async fn get_one<T: Storable>(&self, hints: &Hints, key: &str) -> Result<Option<T>> {
        self.get(hints, &[key]).await?.into_one()
    }

    /// Writes `value` under `key`, replacing what was there. A zero `ttl` means no expiry.
    #[instrument(skip_all, fields(key = %key, connection = hints.connection_or_default()))]
    pub async fn set<T: Storable>(
        &self,
        hints: &Hints,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        if key.is_empty() {
            return Err(Error::InvalidArgument("key is empty".to_string()));
        }
        let conn = self.registry.resolve(hints)?;
        let kind = classify_write(T::SHAPE, hints.kind)?;
        debug!(%kind, "dispatching write");

        match kind {
            Kind::String => string::set(conn, hints, key, value, ttl).await,
            Kind::Hash => hash::set(conn, hints, key, value, ttl).await,
            _ => sequence::set(conn, hints, kind, key, value, ttl).await,
        }
    }

    /// Writes every entry in one batch. Values share one type, so one structure serves all.
    #[instrument(
        skip_all,
        fields(keys = entries.len(), connection = hints.connection_or_default())
    )]
    pub async fn mset<T: Storable, S: AsRef<str>>(
        &self,
        hints: &Hints,
        entries: &[(S, T)],
        ttl: Option<Duration>,
    ) -> Result<()> {
        if entries.is_empty() {
            return Err(Error::InvalidArgument("entries is empty".to_string()));
        }
        let conn = self.registry.resolve(hints)?;
        let kind = classify_write(T::SHAPE, hints.kind)?;
        debug!(%kind, "dispatching batch write");

        let entries: Vec<(&str, &T)> = entries
            .iter()
            .map(|(key, value)| (key.as_ref(), value))
            .collect();
        match kind {
            Kind::String => string::mset(conn, hints, &entries, ttl).await,
            Kind::Hash => hash::mset(conn, hints, &entries, ttl).await,
            _ => sequence::mset(conn, hints, kind, &entries, ttl).await,
        }
    }

    /// See [`Registry::ranking_board`].
    pub fn ranking_board<S: AsRef<str>>(&self, hints: &Hints, parts: &[S]) -> Result<RankingBoard> {
        self.registry.ranking_board(hints, parts)
    }
}
