use bytes::Bytes;
use std::time::Duration;

use crate::commands::executable::Executable;
use crate::commands::{expire_millis, invalid_expire_time, MAX_TTL};
use crate::frame::Frame;
use crate::store::{InnerStoreLocked, Value};

/// Set key to hold the string value, optionally with a TTL in milliseconds (`PX`). If key
/// already holds a value, it is overwritten, regardless of its type, and any previous time to
/// live is discarded.
///
/// Ref: <https://redis.io/docs/latest/commands/set/>
#[derive(Clone, Debug, PartialEq)]
pub struct Set {
    pub key: String,
    pub value: Bytes,
    pub ttl: Option<Duration>,
}

impl Executable for Set {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        match self.ttl {
            Some(ttl) if ttl.as_millis() == 0 || ttl > MAX_TTL => invalid_expire_time("set"),
            Some(ttl) => {
                store.set_with_ttl(self.key, Value::String(self.value), ttl);
                Frame::ok()
            }
            None => {
                store.set(self.key, Value::String(self.value));
                Frame::ok()
            }
        }
    }
}

impl Set {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("SET");
        cmd.arg(&self.key).arg(&self.value[..]);
        if let Some(ttl) = self.ttl {
            cmd.arg("PX").arg(expire_millis(ttl));
        }
        cmd
    }
}
