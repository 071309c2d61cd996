//! Typed data access on top of a Redis-compatible store.
//!
//! Values are read and written through [`Accessor`], which picks the server-side structure
//! (string, hash, list, set or sorted set) from the shape of the Rust type and the call's
//! [`Hints`]. Leaderboards live in [`RankingBoard`].

pub mod accessor;
pub mod adapters;
pub mod cache;
pub mod client;
pub mod codec;
pub mod commands;
pub mod config;
pub mod frame;
pub mod hints;
pub mod keys;
pub mod kind;
pub mod ranking;
pub mod registry;
pub mod store;

use thiserror::Error as ThisError;

pub use accessor::{Accessor, Fetched};
pub use client::{MemoryClient, RedisClient, StoreClient};
pub use codec::{Record, Scalar, Storable};
pub use config::ConnectionConfig;
pub use hints::Hints;
pub use kind::{Kind, Shape};
pub use ranking::{RankingBoard, UpsertKind};
pub use registry::{Connection, Registry};

#[derive(Debug, ThisError, PartialEq)]
pub enum Error {
    #[error("invalid argument; {0}")]
    InvalidArgument(String),
    #[error("decode error; cannot read {input:?} as {target}: {reason}")]
    Decode {
        input: String,
        target: &'static str,
        reason: String,
    },
    #[error("write rejected; {0}")]
    WriteRejected(String),
    #[error("transport error; {0}")]
    Transport(String),
}

impl Error {
    pub(crate) fn decode(input: &str, target: &'static str, reason: impl ToString) -> Error {
        Error::Decode {
            input: input.to_string(),
            target,
            reason: reason.to_string(),
        }
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::Transport("deadline exceeded".to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
