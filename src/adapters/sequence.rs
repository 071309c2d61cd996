//! Lists and sets. Both read into a sequence element by element and are written by deleting
//! the key and pushing every element again.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;

use crate::adapters::{normalize_ttl, read_many, read_one, rewrite, write_all};
use crate::codec::Storable;
use crate::commands::{Command, Lrange, Rpush, Sadd, Smembers};
use crate::frame::Frame;
use crate::hints::Hints;
use crate::kind::Kind;
use crate::registry::Connection;
use crate::{Error, Result};

pub async fn get_one<T: Storable>(
    conn: &Connection,
    hints: &Hints,
    kind: Kind,
    key: &str,
) -> Result<Option<T>> {
    let read = reader(hints, kind)?;
    read_one(conn, hints, key, read, decode_elements).await
}

pub async fn get_many<T: Storable>(
    conn: &Connection,
    hints: &Hints,
    kind: Kind,
    keys: &[String],
) -> Result<HashMap<String, Option<T>>> {
    let read = reader(hints, kind)?;
    read_many(conn, hints, keys, read, decode_elements).await
}

/// Lists honor the range hints; sets are always read whole.
fn reader(hints: &Hints, kind: Kind) -> Result<impl Fn(String) -> Command> {
    let (start, stop) = (hints.start_or_default(), hints.stop_or_default());
    let list = match kind {
        Kind::List => true,
        Kind::Set => false,
        kind => return Err(not_a_sequence(kind)),
    };

    Ok(move |key| {
        if list {
            Command::from(Lrange { key, start, stop })
        } else {
            Command::from(Smembers { key })
        }
    })
}

/// An empty list or set is a missing key.
pub(crate) fn decode_elements<T: Storable>(reply: Frame) -> Result<Option<T>> {
    let elements = reply.into_strings()?;
    if elements.is_empty() {
        return Ok(None);
    }
    T::from_elements(elements).map(Some)
}

pub async fn set<T: Storable>(
    conn: &Connection,
    hints: &Hints,
    kind: Kind,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<()> {
    mset(conn, hints, kind, &[(key, value)], ttl).await
}

/// Rewrites every key in one atomic batch: `DEL`, `RPUSH`/`SADD`, `PEXPIRE`.
pub async fn mset<T: Storable>(
    conn: &Connection,
    hints: &Hints,
    kind: Kind,
    entries: &[(&str, &T)],
    ttl: Option<Duration>,
) -> Result<()> {
    if !matches!(kind, Kind::List | Kind::Set) {
        return Err(not_a_sequence(kind));
    }

    let ttl = normalize_ttl(ttl)?;
    let mut cmds = Vec::with_capacity(entries.len() * 3);
    for (key, value) in entries {
        let key = conn.namer().qualify_one(key)?;
        let elements: Vec<Bytes> = value.to_elements()?.into_iter().map(Bytes::from).collect();

        let write = (!elements.is_empty()).then(|| match kind {
            Kind::List => Command::from(Rpush {
                key: key.clone(),
                values: elements,
            }),
            _ => Command::from(Sadd {
                key: key.clone(),
                members: elements,
            }),
        });
        cmds.extend(rewrite(key, write, ttl));
    }

    write_all(conn, hints, cmds).await
}

fn not_a_sequence(kind: Kind) -> Error {
    Error::InvalidArgument(format!("{kind} is not a list or a set"))
}
