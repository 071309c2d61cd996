use bytes::Bytes;
use std::collections::VecDeque;

use crate::commands::executable::Executable;
use crate::commands::wrong_number_of_arguments;
use crate::frame::Frame;
use crate::store::{InnerStoreLocked, Value};

/// Insert all the specified values at the tail of the list stored at key. Returns the length of
/// the list after the push.
///
/// Ref: <https://redis.io/docs/latest/commands/rpush/>
#[derive(Clone, Debug, PartialEq)]
pub struct Rpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Rpush {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        if self.values.is_empty() {
            return wrong_number_of_arguments("rpush");
        }

        match store.get_or_insert_with(&self.key, || Value::List(VecDeque::new())) {
            Value::List(list) => {
                list.extend(self.values);
                Frame::Integer(list.len() as i64)
            }
            _ => Frame::wrong_type(),
        }
    }
}

impl Rpush {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("RPUSH");
        cmd.arg(&self.key);
        for value in &self.values {
            cmd.arg(&value[..]);
        }
        cmd
    }
}
