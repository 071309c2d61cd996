pub mod del;
pub mod executable;
pub mod get;
pub mod hgetall;
pub mod hset;
pub mod lrange;
pub mod mget;
pub mod pexpire;
pub mod rpush;
pub mod sadd;
pub mod set;
pub mod smembers;
pub mod zadd;
pub mod zincrby;
pub mod zrange;
pub mod zrem;
pub mod zscore;

use std::time::Duration;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::InnerStoreLocked;

pub use del::Del;
pub use get::Get;
pub use hgetall::Hgetall;
pub use hset::Hset;
pub use lrange::Lrange;
pub use mget::Mget;
pub use pexpire::Pexpire;
pub use rpush::Rpush;
pub use sadd::Sadd;
pub use set::Set;
pub use smembers::Smembers;
pub use zadd::{Zadd, ZaddCondition};
pub use zincrby::Zincrby;
pub use zrange::Zrange;
pub use zrem::Zrem;
pub use zscore::Zscore;

/// Every store primitive the accessor and the ranking board issue.
///
/// A command either runs against the in-memory [`Store`](crate::store::Store) through
/// [`Executable`], or is rendered with [`Command::to_cmd`] and sent to a live server.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Del(Del),
    Get(Get),
    Hgetall(Hgetall),
    Hset(Hset),
    Lrange(Lrange),
    Mget(Mget),
    Pexpire(Pexpire),
    Rpush(Rpush),
    Sadd(Sadd),
    Set(Set),
    Smembers(Smembers),
    Zadd(Zadd),
    Zincrby(Zincrby),
    Zrange(Zrange),
    Zrem(Zrem),
    Zscore(Zscore),
}

impl Executable for Command {
    fn exec(self, store: &mut InnerStoreLocked<'_>) -> Frame {
        match self {
            Command::Del(cmd) => cmd.exec(store),
            Command::Get(cmd) => cmd.exec(store),
            Command::Hgetall(cmd) => cmd.exec(store),
            Command::Hset(cmd) => cmd.exec(store),
            Command::Lrange(cmd) => cmd.exec(store),
            Command::Mget(cmd) => cmd.exec(store),
            Command::Pexpire(cmd) => cmd.exec(store),
            Command::Rpush(cmd) => cmd.exec(store),
            Command::Sadd(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
            Command::Smembers(cmd) => cmd.exec(store),
            Command::Zadd(cmd) => cmd.exec(store),
            Command::Zincrby(cmd) => cmd.exec(store),
            Command::Zrange(cmd) => cmd.exec(store),
            Command::Zrem(cmd) => cmd.exec(store),
            Command::Zscore(cmd) => cmd.exec(store),
        }
    }
}

impl Command {
    pub fn to_cmd(&self) -> redis::Cmd {
        match self {
            Command::Del(cmd) => cmd.to_cmd(),
            Command::Get(cmd) => cmd.to_cmd(),
            Command::Hgetall(cmd) => cmd.to_cmd(),
            Command::Hset(cmd) => cmd.to_cmd(),
            Command::Lrange(cmd) => cmd.to_cmd(),
            Command::Mget(cmd) => cmd.to_cmd(),
            Command::Pexpire(cmd) => cmd.to_cmd(),
            Command::Rpush(cmd) => cmd.to_cmd(),
            Command::Sadd(cmd) => cmd.to_cmd(),
            Command::Set(cmd) => cmd.to_cmd(),
            Command::Smembers(cmd) => cmd.to_cmd(),
            Command::Zadd(cmd) => cmd.to_cmd(),
            Command::Zincrby(cmd) => cmd.to_cmd(),
            Command::Zrange(cmd) => cmd.to_cmd(),
            Command::Zrem(cmd) => cmd.to_cmd(),
            Command::Zscore(cmd) => cmd.to_cmd(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Del(_) => "DEL",
            Command::Get(_) => "GET",
            Command::Hgetall(_) => "HGETALL",
            Command::Hset(_) => "HSET",
            Command::Lrange(_) => "LRANGE",
            Command::Mget(_) => "MGET",
            Command::Pexpire(_) => "PEXPIRE",
            Command::Rpush(_) => "RPUSH",
            Command::Sadd(_) => "SADD",
            Command::Set(_) => "SET",
            Command::Smembers(_) => "SMEMBERS",
            Command::Zadd(_) => "ZADD",
            Command::Zincrby(_) => "ZINCRBY",
            Command::Zrange(_) => "ZRANGE",
            Command::Zrem(_) => "ZREM",
            Command::Zscore(_) => "ZSCORE",
        }
    }
}

macro_rules! impl_from_command {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Command {
                fn from(cmd: $variant) -> Self {
                    Command::$variant(cmd)
                }
            }
        )*
    };
}

impl_from_command!(
    Del, Get, Hgetall, Hset, Lrange, Mget, Pexpire, Rpush, Sadd, Set, Smembers, Zadd, Zincrby,
    Zrange, Zrem, Zscore,
);

/// Longest expiry the commands accept. A server keeps expiry times as epoch milliseconds in
/// an `i64`; half of that range leaves room for the current time.
pub const MAX_TTL: Duration = Duration::from_millis(i64::MAX as u64 / 2);

pub(crate) fn invalid_expire_time(command: &str) -> Frame {
    Frame::Error(format!("ERR invalid expire time in '{}' command", command))
}

/// The `PX`/`PEXPIRE` argument. Saturates, so an oversized TTL is refused by the server
/// instead of wrapping around.
pub(crate) fn expire_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}

pub(crate) fn wrong_number_of_arguments(command: &str) -> Frame {
    Frame::Error(format!(
        "ERR wrong number of arguments for '{}' command",
        command
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use bytes::Bytes;

    #[test]
    fn render_set_with_ttl() {
        let cmd = Command::from(Set {
            key: String::from("foo"),
            value: Bytes::from("bar"),
            ttl: Some(Duration::from_millis(1500)),
        });

        assert_eq!(cmd.name(), "SET");
        assert_eq!(
            cmd.to_cmd().get_packed_command(),
            redis::cmd("SET")
                .arg("foo")
                .arg("bar")
                .arg("PX")
                .arg(1500u64)
                .get_packed_command()
        );
    }

    #[test]
    fn expire_argument_saturates() {
        assert_eq!(expire_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(expire_millis(Duration::MAX), u64::MAX);
    }

    #[tokio::test]
    async fn dispatch_through_enum() {
        let store = Store::new();
        let mut locked = store.lock();

        let set = Command::from(Set {
            key: String::from("foo"),
            value: Bytes::from("bar"),
            ttl: None,
        });
        assert_eq!(set.exec(&mut locked), Frame::ok());

        let get = Command::from(Get {
            key: String::from("foo"),
        });
        assert_eq!(get.exec(&mut locked), Frame::bulk("bar"));
    }
}
