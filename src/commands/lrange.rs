use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::{index_range, InnerStoreLocked, Value};

/// Returns the specified elements of the list stored at key. `start` and `stop` are inclusive,
/// zero-based offsets; negative offsets count from the end of the list.
///
/// Ref: <https://redis.io/docs/latest/commands/lrange/>
#[derive(Clone, Debug, PartialEq)]
pub struct Lrange {
    pub key: String,
    pub start: i64,
    pub stop: i64,
}

impl Executable for Lrange {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        match store.get(&self.key) {
            Some(Value::List(list)) => {
                let range = index_range(list.len(), self.start, self.stop);
                Frame::Array(
                    list.range(range)
                        .map(|value| Frame::Bulk(value.clone()))
                        .collect(),
                )
            }
            Some(_) => Frame::wrong_type(),
            None => Frame::Array(vec![]),
        }
    }
}

impl Lrange {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("LRANGE");
        cmd.arg(&self.key).arg(self.start).arg(self.stop);
        cmd
    }
}
