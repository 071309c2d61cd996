use crate::commands::executable::Executable;
use crate::commands::wrong_number_of_arguments;
use crate::frame::Frame;
use crate::store::{InnerStoreLocked, Value};

/// Removes the specified members from the sorted set stored at key. Returns the number of
/// members removed.
///
/// Ref: <https://redis.io/docs/latest/commands/zrem/>
#[derive(Clone, Debug, PartialEq)]
pub struct Zrem {
    pub key: String,
    pub members: Vec<String>,
}

impl Executable for Zrem {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        if self.members.is_empty() {
            return wrong_number_of_arguments("zrem");
        }

        let removed = match store.get_mut(&self.key) {
            Some(Value::SortedSet(zset)) => self
                .members
                .iter()
                .filter(|member| zset.remove(*member).is_some())
                .count(),
            Some(_) => return Frame::wrong_type(),
            None => 0,
        };

        store.remove_if_empty(&self.key);
        Frame::Integer(removed as i64)
    }
}

impl Zrem {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("ZREM");
        cmd.arg(&self.key).arg(&self.members);
        cmd
    }
}
