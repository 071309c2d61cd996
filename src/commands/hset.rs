use bytes::Bytes;
use std::collections::HashMap;

use crate::commands::executable::Executable;
use crate::commands::wrong_number_of_arguments;
use crate::frame::Frame;
use crate::store::{InnerStoreLocked, Value};

/// Sets the specified fields to their respective values in the hash stored at key, creating
/// the hash if needed. Returns the number of fields that were added.
///
/// Ref: <https://redis.io/docs/latest/commands/hset/>
#[derive(Clone, Debug, PartialEq)]
pub struct Hset {
    pub key: String,
    pub fields: Vec<(String, Bytes)>,
}

impl Executable for Hset {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        if self.fields.is_empty() {
            return wrong_number_of_arguments("hset");
        }

        let hash = match store.get_or_insert_with(&self.key, || Value::Hash(HashMap::new())) {
            Value::Hash(hash) => hash,
            _ => return Frame::wrong_type(),
        };

        let mut added = 0;
        for (field, value) in self.fields {
            if hash.insert(field, value).is_none() {
                added += 1;
            }
        }
        Frame::Integer(added)
    }
}

impl Hset {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("HSET");
        cmd.arg(&self.key);
        for (field, value) in &self.fields {
            cmd.arg(field).arg(&value[..]);
        }
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[tokio::test]
    async fn add_and_update_fields() {
        let store = Store::new();
        let mut store = store.lock();

        let cmd = Hset {
            key: String::from("h"),
            fields: vec![(String::from("k1"), Bytes::from("v1"))],
        };
        assert_eq!(cmd.exec(&mut store), Frame::Integer(1));

        let cmd = Hset {
            key: String::from("h"),
            fields: vec![
                (String::from("k1"), Bytes::from("v1bis")),
                (String::from("k2"), Bytes::from("v2")),
            ],
        };
        assert_eq!(cmd.exec(&mut store), Frame::Integer(1));

        assert_eq!(
            store.get("h"),
            Some(&Value::Hash(HashMap::from([
                (String::from("k1"), Bytes::from("v1bis")),
                (String::from("k2"), Bytes::from("v2")),
            ])))
        );
    }

    #[tokio::test]
    async fn wrong_type() {
        let store = Store::new();
        let mut store = store.lock();
        store.set(String::from("s"), Value::String(Bytes::from("x")));

        let cmd = Hset {
            key: String::from("s"),
            fields: vec![(String::from("k1"), Bytes::from("v1"))],
        };

        assert_eq!(cmd.exec(&mut store), Frame::wrong_type());
    }
}
