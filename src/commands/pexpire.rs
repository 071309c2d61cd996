use std::time::Duration;

use crate::commands::executable::Executable;
use crate::commands::{expire_millis, invalid_expire_time, MAX_TTL};
use crate::frame::Frame;
use crate::store::InnerStoreLocked;

/// Set a timeout on key, in milliseconds. Returns 1 if the timeout was set, 0 if the key does
/// not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/pexpire/>
#[derive(Clone, Debug, PartialEq)]
pub struct Pexpire {
    pub key: String,
    pub ttl: Duration,
}

impl Executable for Pexpire {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        // A non-positive timeout deletes the key right away.
        if self.ttl.as_millis() == 0 {
            return Frame::Integer(store.remove(&self.key).is_some() as i64);
        }
        if self.ttl > MAX_TTL {
            return invalid_expire_time("pexpire");
        }

        Frame::Integer(store.expire(&self.key, self.ttl) as i64)
    }
}

impl Pexpire {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("PEXPIRE");
        cmd.arg(&self.key).arg(expire_millis(self.ttl));
        cmd
    }
}
