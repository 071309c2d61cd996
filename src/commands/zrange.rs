use crate::commands::executable::Executable;
use crate::frame::{format_score, Frame};
use crate::store::{index_range, ranked, InnerStoreLocked, Value};

/// Returns the specified range of members in the sorted set stored at key, by rank.
///
/// Members are ordered from the lowest to the highest score, equal scores in lexicographical
/// member order. `rev` reverses that order entirely. With `with_scores` the reply alternates
/// members and scores.
///
/// Ref: <https://redis.io/docs/latest/commands/zrange/>
#[derive(Clone, Debug, PartialEq)]
pub struct Zrange {
    pub key: String,
    pub start: i64,
    pub stop: i64,
    pub rev: bool,
    pub with_scores: bool,
}

impl Executable for Zrange {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        let zset = match store.get(&self.key) {
            Some(Value::SortedSet(zset)) => zset,
            Some(_) => return Frame::wrong_type(),
            None => return Frame::Array(vec![]),
        };

        let mut members = ranked(zset);
        if self.rev {
            members.reverse();
        }

        let range = index_range(members.len(), self.start, self.stop);
        let mut frames = Vec::with_capacity(range.len() * 2);
        for (member, score) in &members[range] {
            frames.push(Frame::bulk(member.to_string()));
            if self.with_scores {
                frames.push(Frame::bulk(format_score(*score)));
            }
        }
        Frame::Array(frames)
    }
}

impl Zrange {
    pub fn to_cmd(&self) -> redis::Cmd {
        let mut cmd = redis::cmd("ZRANGE");
        cmd.arg(&self.key).arg(self.start).arg(self.stop);
        if self.rev {
            cmd.arg("REV");
        }
        if self.with_scores {
            cmd.arg("WITHSCORES");
        }
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use std::collections::HashMap;

    fn board(store: &Store) {
        store.lock().set(
            String::from("z"),
            Value::SortedSet(HashMap::from([
                (String::from("a"), 1.0),
                (String::from("b"), 2.0),
                (String::from("c"), 2.0),
                (String::from("d"), 4.0),
                (String::from("e"), 5.0),
            ])),
        );
    }

    fn zrange(start: i64, stop: i64, rev: bool, with_scores: bool) -> Zrange {
        Zrange {
            key: String::from("z"),
            start,
            stop,
            rev,
            with_scores,
        }
    }

    #[tokio::test]
    async fn ascending_with_scores() {
        let store = Store::new();
        board(&store);

        assert_eq!(
            zrange(0, 2, false, true).exec(&mut store.lock()),
            Frame::Array(vec![
                Frame::bulk("a"),
                Frame::bulk("1"),
                Frame::bulk("b"),
                Frame::bulk("2"),
                Frame::bulk("c"),
                Frame::bulk("2"),
            ])
        );
    }

    #[tokio::test]
    async fn descending_members() {
        let store = Store::new();
        board(&store);

        assert_eq!(
            zrange(0, 1, true, false).exec(&mut store.lock()),
            Frame::Array(vec![Frame::bulk("e"), Frame::bulk("d")])
        );
        assert_eq!(
            zrange(-2, -1, true, false).exec(&mut store.lock()),
            Frame::Array(vec![Frame::bulk("b"), Frame::bulk("a")])
        );
    }

    #[tokio::test]
    async fn missing_key() {
        let store = Store::new();
        assert_eq!(
            zrange(0, -1, true, true).exec(&mut store.lock()),
            Frame::Array(vec![])
        );
    }
}
