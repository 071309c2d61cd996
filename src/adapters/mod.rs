//! One adapter per server-side structure. Each reads and writes values of one [`Kind`] for
//! one key or many.
//!
//! Reads of many keys go out as one pipeline and favor availability: a key whose reply fails
//! to decode is logged and comes back as `None`. Writes favor integrity: a batch is a single
//! atomic pipeline and the first failing reply fails the call.
//!
//! [`Kind`]: crate::kind::Kind

pub mod hash;
pub mod sequence;
pub mod sorted_set;
pub mod string;

use std::collections::HashMap;
use std::time::Duration;

use itertools::Itertools;
use tracing::warn;

use crate::codec::format_duration;
use crate::commands::{Command, Del, Pexpire, MAX_TTL};
use crate::frame::Frame;
use crate::hints::Hints;
use crate::registry::Connection;
use crate::{Error, Result};

/// Reads a single key with `read` and decodes the reply with `decode`.
pub(crate) async fn read_one<T>(
    conn: &Connection,
    hints: &Hints,
    key: &str,
    read: impl FnOnce(String) -> Command,
    decode: impl FnOnce(Frame) -> Result<Option<T>>,
) -> Result<Option<T>> {
    let key = conn.namer().qualify_one(key)?;
    let reply = conn.execute(read(key), hints.timeout).await?;
    decode(reply)
}

/// Reads every key in one pipeline. Every requested key is present in the result.
pub(crate) async fn read_many<T>(
    conn: &Connection,
    hints: &Hints,
    keys: &[String],
    read: impl Fn(String) -> Command,
    decode: impl Fn(Frame) -> Result<Option<T>>,
) -> Result<HashMap<String, Option<T>>> {
    let cmds = conn.namer().qualify(keys)?.into_iter().map(read).collect();
    let replies = conn.pipeline(cmds, hints.timeout).await?;

    Ok(keys
        .iter()
        .zip_eq(replies)
        .map(|(key, reply)| (key.clone(), decode_or_skip(key, reply, &decode)))
        .collect())
}

pub(crate) fn decode_or_skip<R, T>(
    key: &str,
    reply: R,
    decode: impl Fn(R) -> Result<Option<T>>,
) -> Option<T> {
    decode(reply).unwrap_or_else(|err| {
        warn!(key, %err, "skipping key in batch read");
        None
    })
}

/// The commands that replace `key` with a fresh structure: `DEL`, then `write` if there is
/// anything to write, then `PEXPIRE` if a TTL is given.
pub(crate) fn rewrite(key: String, write: Option<Command>, ttl: Option<Duration>) -> Vec<Command> {
    let mut cmds = vec![Command::from(Del {
        keys: vec![key.clone()],
    })];
    if let Some(write) = write {
        cmds.push(write);
        if let Some(ttl) = ttl {
            cmds.push(Command::from(Pexpire { key, ttl }));
        }
    }
    cmds
}

/// Sends `cmds` as one atomic batch; an error reply anywhere fails the write.
pub(crate) async fn write_all(conn: &Connection, hints: &Hints, cmds: Vec<Command>) -> Result<()> {
    let replies = conn.pipeline(cmds, hints.timeout).await?;
    replies.into_iter().try_for_each(check_write)
}

pub(crate) fn check_write(reply: Frame) -> Result<()> {
    match reply {
        Frame::Error(msg) => Err(Error::WriteRejected(msg)),
        _ => Ok(()),
    }
}

/// A zero TTL means no expiry. See [`checked_ttl`] for the rest.
pub(crate) fn normalize_ttl(ttl: Option<Duration>) -> Result<Option<Duration>> {
    ttl.filter(|ttl| !ttl.is_zero()).map(checked_ttl).transpose()
}

/// Rejects TTLs longer than [`MAX_TTL`]. Anything shorter than the store's millisecond
/// resolution is rounded up to one millisecond.
pub(crate) fn checked_ttl(ttl: Duration) -> Result<Duration> {
    if ttl > MAX_TTL {
        return Err(Error::InvalidArgument(format!(
            "ttl {} exceeds the longest supported expiry",
            format_duration(ttl)
        )));
    }
    Ok(ttl.max(Duration::from_millis(1)))
}
