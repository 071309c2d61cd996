use bytes::Bytes;
use std::collections::HashSet;

use crate::commands::executable::Executable;
use crate::commands::wrong_number_of_arguments;
use crate::frame::Frame;
use crate::store::{InnerStoreLocked, Value};

/// Add the specified members to the set stored at key. Returns the number of members that were
/// not already present.
///
/// Ref: <https://redis.io/docs/latest/commands/sadd/>
#[derive(Clone, Debug, PartialEq)]
pub struct Sadd {
    pub key: String,
    pub members: Vec<Bytes>,
}

impl Executable for Sadd {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        if self.members.is_empty() {
            return wrong_number_of_arguments("sadd");
        }

        match store.get_or_insert_with(&self.key, || Value::Set(HashSet::new())) {
            Value::Set(set) => {
                let added = self
                    .members
                    .into_iter()
                    .filter(|member| set.insert(member.clone()))
                    .count();
                Frame::Integer(added as i64)
            }
            _ => Frame::wrong_type(),
        }
    }
}

impl Sadd {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("SADD");
        cmd.arg(&self.key);
        for member in &self.members {
            cmd.arg(&member[..]);
        }
        cmd
    }
}
