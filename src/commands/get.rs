use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::{InnerStoreLocked, Value};

/// Get the value of key. If the key does not exist the special value nil is returned. An error
/// is returned if the value stored at key is not a string.
///
/// Ref: <https://redis.io/docs/latest/commands/get/>
#[derive(Clone, Debug, PartialEq)]
pub struct Get {
    pub key: String,
}

impl Executable for Get {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        match store.get(&self.key) {
            Some(Value::String(value)) => Frame::Bulk(value.clone()),
            Some(_) => Frame::wrong_type(),
            None => Frame::Null,
        }
    }
}

impl Get {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("GET");
        cmd.arg(&self.key);
        cmd
    }
}
