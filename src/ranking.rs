use std::collections::HashMap;
use std::time::Duration;

use itertools::Itertools;
use tracing::{error, instrument};

use crate::adapters::checked_ttl;
use crate::commands::{Command, Del, Pexpire, Zadd, ZaddCondition, Zincrby, Zrange, Zrem, Zscore};
use crate::frame::Frame;
use crate::registry::Connection;
use crate::{Error, Result};

/// When an upsert may replace a member's existing score. New members are always added.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpsertKind {
    /// Keep the highest score seen.
    #[default]
    GreaterThan,
    /// Keep the lowest score seen.
    LessThan,
}

impl From<UpsertKind> for ZaddCondition {
    fn from(kind: UpsertKind) -> Self {
        match kind {
            UpsertKind::GreaterThan => ZaddCondition::Gt,
            UpsertKind::LessThan => ZaddCondition::Lt,
        }
    }
}

/// A leaderboard stored in one sorted set.
///
/// Members are unique and hold one score each. Ranks order by score; equal scores order by
/// member name, ascending. Batch writes are best effort: a member whose command fails is
/// logged and left out while its siblings still apply.
#[derive(Clone, Debug)]
pub struct RankingBoard {
    id: String,
    conn: Connection,
    timeout: Option<Duration>,
}

impl RankingBoard {
    /// `id` is the fully qualified sorted-set key.
    pub fn new(id: impl Into<String>, conn: Connection, timeout: Option<Duration>) -> RankingBoard {
        RankingBoard {
            id: id.into(),
            conn,
            timeout,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    #[instrument(skip(self), fields(board = %self.id))]
    pub async fn upsert(&self, member: &str, score: f64, kind: UpsertKind) -> Result<()> {
        let reply = self.execute(self.zadd(member, score, kind)).await?;
        match reply {
            Frame::Error(msg) => Err(Error::WriteRejected(msg)),
            _ => Ok(()),
        }
    }

    /// Upserts every member in one batch.
    #[instrument(skip_all, fields(board = %self.id, members = members.len()))]
    pub async fn upsert_multi<S: AsRef<str>>(
        &self,
        members: &[(S, f64)],
        kind: UpsertKind,
    ) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }
        let cmds = members
            .iter()
            .map(|(member, score)| Command::from(self.zadd(member.as_ref(), *score, kind)))
            .collect();
        let replies = self.pipeline(cmds).await?;

        for ((member, _), reply) in members.iter().zip_eq(replies) {
            if let Frame::Error(msg) = reply {
                let member: &str = member.as_ref();
                error!(member, error = %msg, "upsert failed");
            }
        }
        Ok(())
    }

    /// Adds `delta` to the member's score, creating the member at `delta`. Returns the new score.
    #[instrument(skip(self), fields(board = %self.id))]
    pub async fn incr_by(&self, member: &str, delta: f64) -> Result<f64> {
        let reply = self.execute(self.zincrby(member, delta)).await?;
        match reply {
            Frame::Error(msg) => Err(Error::WriteRejected(msg)),
            reply => new_score(reply),
        }
    }

    /// Increments every member in one batch. A member whose increment fails is missing from
    /// the result.
    #[instrument(skip_all, fields(board = %self.id, members = increments.len()))]
    pub async fn incr_by_multi<S: AsRef<str>>(
        &self,
        increments: &[(S, f64)],
    ) -> Result<HashMap<String, f64>> {
        if increments.is_empty() {
            return Ok(HashMap::new());
        }
        let cmds = increments
            .iter()
            .map(|(member, delta)| Command::from(self.zincrby(member.as_ref(), *delta)))
            .collect();
        let replies = self.pipeline(cmds).await?;

        let mut scores = HashMap::with_capacity(increments.len());
        for ((member, _), reply) in increments.iter().zip_eq(replies) {
            let member: &str = member.as_ref();
            match reply.into_result().and_then(new_score) {
                Ok(score) => {
                    scores.insert(member.to_string(), score);
                }
                Err(err) => error!(member, %err, "increment failed"),
            }
        }
        Ok(scores)
    }

    /// The first `n` members by rank with their scores, highest first when `descending`.
    /// A board that does not exist has no members.
    #[instrument(skip(self), fields(board = %self.id))]
    pub async fn top(&self, n: usize, descending: bool) -> Result<Vec<(String, f64)>> {
        if n == 0 {
            return Ok(vec![]);
        }
        let stop = i64::try_from(n).unwrap_or(i64::MAX) - 1;
        let zrange = Zrange {
            key: self.id.clone(),
            start: 0,
            stop,
            rev: descending,
            with_scores: true,
        };
        self.execute(zrange).await?.into_scored_members()
    }

    /// The member's score, 0 if it is not on the board.
    #[instrument(skip(self), fields(board = %self.id))]
    pub async fn score(&self, member: &str) -> Result<f64> {
        let reply = self.execute(self.zscore(member)).await?;
        Ok(reply.into_score()?.unwrap_or(0.0))
    }

    /// Scores of every member in one batch; absent members score 0. A member whose reply
    /// fails is logged and left out.
    #[instrument(skip_all, fields(board = %self.id, members = members.len()))]
    pub async fn scores<S: AsRef<str>>(&self, members: &[S]) -> Result<HashMap<String, f64>> {
        if members.is_empty() {
            return Ok(HashMap::new());
        }
        let cmds = members
            .iter()
            .map(|member| Command::from(self.zscore(member.as_ref())))
            .collect();
        let replies = self.pipeline(cmds).await?;

        let mut scores = HashMap::with_capacity(members.len());
        for (member, reply) in members.iter().zip_eq(replies) {
            let member: &str = member.as_ref();
            match reply.into_score() {
                Ok(score) => {
                    scores.insert(member.to_string(), score.unwrap_or(0.0));
                }
                Err(err) => error!(member, %err, "score lookup failed"),
            }
        }
        Ok(scores)
    }

    /// Removes the member. Returns whether it was on the board.
    pub async fn remove(&self, member: &str) -> Result<bool> {
        let zrem = Zrem {
            key: self.id.clone(),
            members: vec![member.to_string()],
        };
        self.execute(zrem).await?.into_result().map(count_is_positive)
    }

    /// Drops the whole board. Returns whether it existed.
    pub async fn delete(&self) -> Result<bool> {
        let del = Del {
            keys: vec![self.id.clone()],
        };
        self.execute(del).await?.into_result().map(count_is_positive)
    }

    /// Expires the whole board after `ttl`. Returns whether the board exists.
    ///
    /// A zero `ttl` drops the board right away. Anything shorter than a millisecond is rounded
    /// up to one.
    pub async fn expire(&self, ttl: Duration) -> Result<bool> {
        let ttl = if ttl.is_zero() { ttl } else { checked_ttl(ttl)? };
        let pexpire = Pexpire {
            key: self.id.clone(),
            ttl,
        };
        self.execute(pexpire).await?.into_result().map(count_is_positive)
    }

    fn zadd(&self, member: &str, score: f64, kind: UpsertKind) -> Zadd {
        Zadd {
            key: self.id.clone(),
            member: member.to_string(),
            score,
            condition: Some(kind.into()),
        }
    }

    fn zincrby(&self, member: &str, increment: f64) -> Zincrby {
        Zincrby {
            key: self.id.clone(),
            member: member.to_string(),
            increment,
        }
    }

    fn zscore(&self, member: &str) -> Zscore {
        Zscore {
            key: self.id.clone(),
            member: member.to_string(),
        }
    }

    async fn execute(&self, cmd: impl Into<Command>) -> Result<Frame> {
        self.conn.execute(cmd, self.timeout).await
    }

    async fn pipeline(&self, cmds: Vec<Command>) -> Result<Vec<Frame>> {
        self.conn.pipeline(cmds, self.timeout).await
    }
}

fn new_score(reply: Frame) -> Result<f64> {
    reply
        .into_score()?
        .ok_or_else(|| Error::Transport("protocol error; increment returned no score".to_string()))
}

fn count_is_positive(reply: Frame) -> bool {
    matches!(reply, Frame::Integer(n) if n > 0)
}
