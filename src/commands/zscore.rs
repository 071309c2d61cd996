use crate::commands::executable::Executable;
use crate::frame::{format_score, Frame};
use crate::store::{InnerStoreLocked, Value};

/// Returns the score of member in the sorted set at key, or nil if the member or the key does
/// not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/zscore/>
#[derive(Clone, Debug, PartialEq)]
pub struct Zscore {
    pub key: String,
    pub member: String,
}

impl Executable for Zscore {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        match store.get(&self.key) {
            Some(Value::SortedSet(zset)) => zset
                .get(&self.member)
                .map(|score| Frame::bulk(format_score(*score)))
                .unwrap_or(Frame::Null),
            Some(_) => Frame::wrong_type(),
            None => Frame::Null,
        }
    }
}

impl Zscore {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("ZSCORE");
        cmd.arg(&self.key).arg(&self.member);
        cmd
    }
}
