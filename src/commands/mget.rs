use crate::commands::executable::Executable;
use crate::commands::wrong_number_of_arguments;
use crate::frame::Frame;
use crate::store::{InnerStoreLocked, Value};

/// Returns the values of all specified keys. For every key that does not hold a string value or
/// does not exist, the special value nil is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/mget/>
#[derive(Clone, Debug, PartialEq)]
pub struct Mget {
    pub keys: Vec<String>,
}

impl Executable for Mget {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        if self.keys.is_empty() {
            return wrong_number_of_arguments("mget");
        }

        let values = self
            .keys
            .iter()
            .map(|key| match store.get(key) {
                Some(Value::String(value)) => Frame::Bulk(value.clone()),
                _ => Frame::Null,
            })
            .collect::<Vec<_>>();

        Frame::Array(values)
    }
}

impl Mget {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("MGET");
        cmd.arg(&self.keys);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use bytes::Bytes;

    #[tokio::test]
    async fn existing_keys() {
        let store = Store::new();
        let mut store = store.lock();
        store.set(String::from("key1"), Value::String(Bytes::from("1")));
        store.set(String::from("key2"), Value::String(Bytes::from("2")));

        let cmd = Mget {
            keys: vec![String::from("key1"), String::from("key2")],
        };

        assert_eq!(
            cmd.exec(&mut store),
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("1")),
                Frame::Bulk(Bytes::from("2"))
            ])
        );
    }

    #[tokio::test]
    async fn mixed_keys() {
        let store = Store::new();
        let mut store = store.lock();
        store.set(String::from("key1"), Value::String(Bytes::from("1")));
        store.set(String::from("key3"), Value::Hash(Default::default()));

        let cmd = Mget {
            keys: vec![
                String::from("key1"),
                String::from("key2"),
                String::from("key3"),
            ],
        };

        assert_eq!(
            cmd.exec(&mut store),
            Frame::Array(vec![Frame::Bulk(Bytes::from("1")), Frame::Null, Frame::Null])
        );
    }

    #[tokio::test]
    async fn no_keys() {
        let store = Store::new();

        let cmd = Mget { keys: vec![] };

        assert_eq!(
            cmd.exec(&mut store.lock()),
            Frame::Error("ERR wrong number of arguments for 'mget' command".to_string())
        );
    }
}
