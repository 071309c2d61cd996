use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use itertools::Itertools;

use crate::adapters::{decode_or_skip, normalize_ttl, read_one};
use crate::codec::Storable;
use crate::commands::{Command, Get, Mget, Set};
use crate::frame::Frame;
use crate::hints::Hints;
use crate::registry::Connection;
use crate::{Error, Result};

pub async fn get_one<T: Storable>(
    conn: &Connection,
    hints: &Hints,
    key: &str,
) -> Result<Option<T>> {
    read_one(conn, hints, key, |key| Command::from(Get { key }), decode).await
}

/// One `MGET` for all keys. Missing keys and keys that fail to decode map to `None`.
pub async fn get_many<T: Storable>(
    conn: &Connection,
    hints: &Hints,
    keys: &[String],
) -> Result<HashMap<String, Option<T>>> {
    let qualified = conn.namer().qualify(keys)?;
    let reply = conn
        .execute(Mget { keys: qualified }, hints.timeout)
        .await?;

    let values = reply.into_optional_strings()?;
    if values.len() != keys.len() {
        return Err(Error::Transport(format!(
            "protocol error; asked for {} keys, got {} values",
            keys.len(),
            values.len()
        )));
    }

    Ok(keys
        .iter()
        .zip_eq(values)
        .map(|(key, value)| {
            let value = decode_or_skip(key, value, |value: Option<String>| {
                value.map(|wire| T::decode(&wire)).transpose()
            });
            (key.clone(), value)
        })
        .collect())
}

fn decode<T: Storable>(reply: Frame) -> Result<Option<T>> {
    reply.into_string()?.map(|wire| T::decode(&wire)).transpose()
}

/// `SET key value [PX ttl]`. Anything but `OK` is a rejected write.
pub async fn set<T: Storable>(
    conn: &Connection,
    hints: &Hints,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<()> {
    let cmd = set_command(conn, key, value, ttl)?;
    let reply = conn.execute(cmd, hints.timeout).await?;
    check_ok(reply)
}

/// All `SET`s in one atomic batch.
pub async fn mset<T: Storable>(
    conn: &Connection,
    hints: &Hints,
    entries: &[(&str, &T)],
    ttl: Option<Duration>,
) -> Result<()> {
    let cmds = entries
        .iter()
        .map(|(key, value)| set_command(conn, key, *value, ttl).map(Command::from))
        .collect::<Result<Vec<_>>>()?;

    let replies = conn.pipeline(cmds, hints.timeout).await?;
    replies.into_iter().try_for_each(check_ok)
}

fn set_command<T: Storable>(
    conn: &Connection,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<Set> {
    Ok(Set {
        key: conn.namer().qualify_one(key)?,
        value: Bytes::from(value.encode()?),
        ttl: normalize_ttl(ttl)?,
    })
}

fn check_ok(reply: Frame) -> Result<()> {
    match reply {
        Frame::Error(msg) => Err(Error::WriteRejected(msg)),
        reply if reply.is_ok() => Ok(()),
        reply => Err(Error::WriteRejected(format!("unexpected reply {reply}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryClient;
    use crate::codec::Record;
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Geo {
        loc: String,
        unit: String,
    }

    fn connection() -> Connection {
        Connection::new("default", "test", Arc::new(MemoryClient::new())).unwrap()
    }

    #[tokio::test]
    async fn scalar_round_trip() {
        let conn = connection();
        let hints = Hints::new();

        set(&conn, &hints, "n", &42i64, None).await.unwrap();
        assert_eq!(get_one::<i64>(&conn, &hints, "n").await, Ok(Some(42)));
        assert_eq!(get_one::<i64>(&conn, &hints, "absent").await, Ok(None));
    }

    #[tokio::test]
    async fn many_keys_keep_missing_and_broken_ones() {
        let conn = connection();
        let hints = Hints::new();

        let geo = Record(Geo {
            loc: "10.75,106.67".to_string(),
            unit: "km".to_string(),
        });
        mset(&conn, &hints, &[("a", &geo)], None).await.unwrap();
        set(&conn, &hints, "broken", &"{not json".to_string(), None)
            .await
            .unwrap();

        let keys = vec!["a".to_string(), "broken".to_string(), "absent".to_string()];
        let values = get_many::<Record<Geo>>(&conn, &hints, &keys).await.unwrap();

        assert_eq!(values.len(), 3);
        assert_eq!(values["a"], Some(geo));
        assert_eq!(values["broken"], None);
        assert_eq!(values["absent"], None);
    }

    #[tokio::test]
    async fn single_key_decode_error_surfaces() {
        let conn = connection();
        let hints = Hints::new();

        set(&conn, &hints, "k", &"abc".to_string(), None).await.unwrap();
        assert!(matches!(
            get_one::<i32>(&conn, &hints, "k").await,
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn non_ok_reply_is_rejected() {
        assert_eq!(check_ok(Frame::ok()), Ok(()));
        assert!(matches!(check_ok(Frame::Null), Err(Error::WriteRejected(_))));
        assert!(matches!(
            check_ok(Frame::Error("ERR".to_string())),
            Err(Error::WriteRejected(_))
        ));
    }
}
