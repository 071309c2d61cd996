use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::{InnerStoreLocked, Value};

/// Returns all fields and values of the hash stored at key, as a flat `[field, value, ...]`
/// array. A missing key reads as an empty hash.
///
/// Ref: <https://redis.io/docs/latest/commands/hgetall/>
#[derive(Clone, Debug, PartialEq)]
pub struct Hgetall {
    pub key: String,
}

impl Executable for Hgetall {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        match store.get(&self.key) {
            Some(Value::Hash(hash)) => Frame::Array(
                hash.iter()
                    .flat_map(|(field, value)| {
                        [Frame::bulk(field.clone()), Frame::Bulk(value.clone())]
                    })
                    .collect(),
            ),
            Some(_) => Frame::wrong_type(),
            None => Frame::Array(vec![]),
        }
    }
}

impl Hgetall {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("HGETALL");
        cmd.arg(&self.key);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use bytes::Bytes;
    use std::collections::HashMap;

    #[tokio::test]
    async fn existing_hash() {
        let store = Store::new();
        let mut store = store.lock();
        store.set(
            String::from("h"),
            Value::Hash(HashMap::from([(String::from("k1"), Bytes::from("v1"))])),
        );

        let cmd = Hgetall {
            key: String::from("h"),
        };

        assert_eq!(
            cmd.exec(&mut store),
            Frame::Array(vec![Frame::bulk("k1"), Frame::bulk("v1")])
        );
    }

    #[tokio::test]
    async fn missing_hash() {
        let store = Store::new();

        let cmd = Hgetall {
            key: String::from("h"),
        };

        assert_eq!(cmd.exec(&mut store.lock()), Frame::Array(vec![]));
    }
}
