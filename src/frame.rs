// https://redis.io/docs/reference/protocol-spec

use std::fmt;
use std::str;

use bytes::Bytes;

use crate::{Error, Result};

/// A single reply produced by the store for one command.
///
/// Both the in-memory store and a live server answer with frames, so the adapters decode
/// replies in one place regardless of where the command ran. An `Error` frame is a failure of
/// that command alone; inside a pipeline the other replies are still valid.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

pub(crate) const WRONGTYPE: &str =
    "WRONGTYPE Operation against a key holding the wrong kind of value";

impl Frame {
    pub fn ok() -> Frame {
        Frame::Simple("OK".to_string())
    }

    pub fn bulk(value: impl Into<Bytes>) -> Frame {
        Frame::Bulk(value.into())
    }

    pub fn wrong_type() -> Frame {
        Frame::Error(WRONGTYPE.to_string())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Frame::Simple(s) if s == "OK")
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Frame::Error(_))
    }

    /// Turns an error reply into `Err`, passing every other reply through.
    pub fn into_result(self) -> Result<Frame> {
        match self {
            Frame::Error(msg) => Err(Error::Transport(msg)),
            frame => Ok(frame),
        }
    }

    /// Reads a bulk or simple string. A null reply means the key does not exist.
    pub fn into_string(self) -> Result<Option<String>> {
        match self.into_result()? {
            Frame::Null => Ok(None),
            Frame::Simple(s) => Ok(Some(s)),
            Frame::Bulk(bytes) => utf8(bytes).map(Some),
            Frame::Integer(i) => Ok(Some(i.to_string())),
            frame => Err(unexpected("string", &frame)),
        }
    }

    /// Reads an array of strings. A null reply reads as an empty array.
    pub fn into_strings(self) -> Result<Vec<String>> {
        Ok(self.into_optional_strings()?.into_iter().flatten().collect())
    }

    /// Reads an array whose items may be null, as returned by `MGET`.
    pub fn into_optional_strings(self) -> Result<Vec<Option<String>>> {
        match self.into_result()? {
            Frame::Null => Ok(vec![]),
            Frame::Array(frames) => frames.into_iter().map(Frame::into_string).collect(),
            frame => Err(unexpected("array", &frame)),
        }
    }

    /// Reads a flat `[field, value, field, value, ...]` array into pairs.
    pub fn into_pairs(self) -> Result<Vec<(String, String)>> {
        let items = self.into_strings()?;
        if items.len() % 2 != 0 {
            return Err(Error::Transport(format!(
                "protocol error; expected an even number of items, got {}",
                items.len()
            )));
        }

        let mut pairs = Vec::with_capacity(items.len() / 2);
        let mut items = items.into_iter();
        while let (Some(field), Some(value)) = (items.next(), items.next()) {
            pairs.push((field, value));
        }
        Ok(pairs)
    }

    /// Reads a sorted-set score. A null reply means the member does not exist.
    pub fn into_score(self) -> Result<Option<f64>> {
        match self.into_string()? {
            None => Ok(None),
            Some(s) => parse_score(&s).map(Some),
        }
    }

    /// Reads `[member, score, member, score, ...]` as returned by `ZRANGE ... WITHSCORES`.
    pub fn into_scored_members(self) -> Result<Vec<(String, f64)>> {
        self.into_pairs()?
            .into_iter()
            .map(|(member, score)| parse_score(&score).map(|score| (member, score)))
            .collect()
    }
}

pub(crate) fn parse_score(s: &str) -> Result<f64> {
    s.parse::<f64>()
        .map_err(|e| Error::Transport(format!("protocol error; invalid score {s:?}: {e}")))
}

pub(crate) fn format_score(score: f64) -> String {
    match score {
        s if s == f64::INFINITY => "inf".to_string(),
        s if s == f64::NEG_INFINITY => "-inf".to_string(),
        s => s.to_string(),
    }
}

fn utf8(bytes: Bytes) -> Result<String> {
    str::from_utf8(&bytes[..])
        .map(|s| s.to_string())
        .map_err(|e| Error::Transport(format!("protocol error; invalid UTF-8 string: {e}")))
}

fn unexpected(expected: &str, actual: &Frame) -> Error {
    Error::Transport(format!(
        "protocol error; invalid frame, expected {expected}, got {actual}"
    ))
}

impl From<redis::Value> for Frame {
    fn from(value: redis::Value) -> Self {
        match value {
            redis::Value::Nil => Frame::Null,
            redis::Value::Int(i) => Frame::Integer(i),
            redis::Value::BulkString(bytes) => Frame::Bulk(Bytes::from(bytes)),
            redis::Value::Array(values) | redis::Value::Set(values) => {
                Frame::Array(values.into_iter().map(Frame::from).collect())
            }
            redis::Value::Map(pairs) => Frame::Array(
                pairs
                    .into_iter()
                    .flat_map(|(k, v)| [Frame::from(k), Frame::from(v)])
                    .collect(),
            ),
            redis::Value::SimpleString(s) => Frame::Simple(s),
            redis::Value::Okay => Frame::ok(),
            redis::Value::Double(d) => Frame::bulk(format_score(d)),
            redis::Value::Boolean(b) => Frame::Integer(b as i64),
            redis::Value::VerbatimString { text, .. } => Frame::bulk(text),
            redis::Value::BigNumber(n) => Frame::bulk(n.to_string()),
            redis::Value::Attribute { data, .. } => Frame::from(*data),
            redis::Value::Push { data, .. } => {
                Frame::Array(data.into_iter().map(Frame::from).collect())
            }
            // Keeps the reply in its slot, e.g. one rejected command inside `EXEC`.
            redis::Value::ServerError(err) => Frame::Error(match err.details() {
                Some(details) => format!("{} {}", err.code(), details),
                None => err.code().to_string(),
            }),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Null => write!(f, "$-1"),
            Frame::Array(arr) => {
                write!(f, "*{}", arr.len())?;
                for frame in arr {
                    write!(f, " {}", frame)?;
                }
                Ok(())
            }
        }
    }
}
