use std::collections::HashMap;

use crate::commands::executable::Executable;
use crate::frame::{format_score, Frame};
use crate::store::{InnerStoreLocked, Value};

/// Increments the score of member in the sorted set stored at key by increment. A missing
/// member is added with increment as its score. Returns the new score.
///
/// Ref: <https://redis.io/docs/latest/commands/zincrby/>
#[derive(Clone, Debug, PartialEq)]
pub struct Zincrby {
    pub key: String,
    pub member: String,
    pub increment: f64,
}

impl Executable for Zincrby {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        let current = match store.get(&self.key) {
            Some(Value::SortedSet(zset)) => zset.get(&self.member).copied(),
            Some(_) => return Frame::wrong_type(),
            None => None,
        };

        // A rejected increment leaves the set, and the key, untouched.
        let next = current.unwrap_or(0.0) + self.increment;
        if next.is_nan() {
            return Frame::Error("ERR resulting score is not a number (NaN)".to_string());
        }

        match store.get_or_insert_with(&self.key, || Value::SortedSet(HashMap::new())) {
            Value::SortedSet(zset) => {
                zset.insert(self.member, next);
            }
            _ => return Frame::wrong_type(),
        }

        Frame::bulk(format_score(next))
    }
}

impl Zincrby {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("ZINCRBY");
        cmd.arg(&self.key)
            .arg(format_score(self.increment))
            .arg(&self.member);
        cmd
    }
}
