use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::{InnerStoreLocked, Value};

/// Returns all the members of the set value stored at key.
///
/// Ref: <https://redis.io/docs/latest/commands/smembers/>
#[derive(Clone, Debug, PartialEq)]
pub struct Smembers {
    pub key: String,
}

impl Executable for Smembers {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        match store.get(&self.key) {
            Some(Value::Set(set)) => {
                let mut members: Vec<_> = set.iter().cloned().collect();
                // Real servers make no ordering promise; sorting keeps replies reproducible.
                members.sort();
                Frame::Array(members.into_iter().map(Frame::Bulk).collect())
            }
            Some(_) => Frame::wrong_type(),
            None => Frame::Array(vec![]),
        }
    }
}

impl Smembers {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("SMEMBERS");
        cmd.arg(&self.key);
        cmd
    }
}
