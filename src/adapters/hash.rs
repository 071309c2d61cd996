use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;

use crate::adapters::{normalize_ttl, read_many, read_one, rewrite, write_all};
use crate::codec::Storable;
use crate::commands::{Command, Hgetall, Hset};
use crate::frame::Frame;
use crate::hints::Hints;
use crate::registry::Connection;
use crate::Result;

pub async fn get_one<T: Storable>(
    conn: &Connection,
    hints: &Hints,
    key: &str,
) -> Result<Option<T>> {
    read_one(conn, hints, key, read, decode).await
}

pub async fn get_many<T: Storable>(
    conn: &Connection,
    hints: &Hints,
    keys: &[String],
) -> Result<HashMap<String, Option<T>>> {
    read_many(conn, hints, keys, read, decode).await
}

fn read(key: String) -> Command {
    Command::from(Hgetall { key })
}

/// An empty hash is a missing key.
fn decode<T: Storable>(reply: Frame) -> Result<Option<T>> {
    let fields = reply.into_pairs()?;
    if fields.is_empty() {
        return Ok(None);
    }
    T::from_fields(fields).map(Some)
}

pub async fn set<T: Storable>(
    conn: &Connection,
    hints: &Hints,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<()> {
    mset(conn, hints, &[(key, value)], ttl).await
}

/// Replaces every hash in one atomic batch; the first error reply fails the call.
pub async fn mset<T: Storable>(
    conn: &Connection,
    hints: &Hints,
    entries: &[(&str, &T)],
    ttl: Option<Duration>,
) -> Result<()> {
    let ttl = normalize_ttl(ttl)?;
    let mut cmds = Vec::with_capacity(entries.len() * 3);
    for (key, value) in entries {
        let key = conn.namer().qualify_one(key)?;
        let fields: Vec<(String, Bytes)> = value
            .to_fields()?
            .into_iter()
            .map(|(field, wire)| (field, Bytes::from(wire)))
            .collect();

        let write = (!fields.is_empty()).then(|| {
            Command::from(Hset {
                key: key.clone(),
                fields,
            })
        });
        cmds.extend(rewrite(key, write, ttl));
    }

    write_all(conn, hints, cmds).await
}
