use std::collections::HashMap;

use crate::commands::executable::Executable;
use crate::frame::{format_score, Frame};
use crate::store::{InnerStoreLocked, Value};

/// Only update existing members when the new score compares favorably against the current one.
/// New members are always added.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZaddCondition {
    /// `GT`: only update when the new score is strictly greater.
    Gt,
    /// `LT`: only update when the new score is strictly lower.
    Lt,
}

/// Adds a member with the given score to the sorted set stored at key. Returns the number of
/// members added, not counting score updates.
///
/// Ref: <https://redis.io/docs/latest/commands/zadd/>
#[derive(Clone, Debug, PartialEq)]
pub struct Zadd {
    pub key: String,
    pub member: String,
    pub score: f64,
    pub condition: Option<ZaddCondition>,
}

impl Executable for Zadd {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        if self.score.is_nan() {
            return Frame::Error("ERR value is not a valid float".to_string());
        }

        let zset = match store.get_or_insert_with(&self.key, || Value::SortedSet(HashMap::new())) {
            Value::SortedSet(zset) => zset,
            _ => return Frame::wrong_type(),
        };

        match zset.get_mut(&self.member) {
            None => {
                zset.insert(self.member, self.score);
                Frame::Integer(1)
            }
            Some(current) => {
                let update = match self.condition {
                    None => true,
                    Some(ZaddCondition::Gt) => self.score > *current,
                    Some(ZaddCondition::Lt) => self.score < *current,
                };
                if update {
                    *current = self.score;
                }
                Frame::Integer(0)
            }
        }
    }
}

impl Zadd {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("ZADD");
        cmd.arg(&self.key);
        match self.condition {
            Some(ZaddCondition::Gt) => {
                cmd.arg("GT");
            }
            Some(ZaddCondition::Lt) => {
                cmd.arg("LT");
            }
            None => {}
        }
        cmd.arg(format_score(self.score)).arg(&self.member);
        cmd
    }
}
