use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionLike, MultiplexedConnection};
use redis::{AsyncConnectionConfig, IntoConnectionInfo};
use tracing::{debug, info, warn};

use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::frame::Frame;
use crate::store::Store;
use crate::{Error, Result};

/// The store connection the typed layer runs on.
///
/// `execute` sends a single command. `pipeline` sends a batch as one atomic round trip and
/// returns one reply per command, in submission order; a failing command shows up as an
/// error frame at its position while the rest of the batch still applies. `Err` is reserved
/// for failures of the round trip itself.
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn execute(&self, cmd: Command) -> Result<Frame>;

    async fn pipeline(&self, cmds: Vec<Command>) -> Result<Vec<Frame>>;
}

/// A client backed by the in-process [`Store`]. A pipeline holds the store lock for the whole
/// batch, so no other caller observes it half applied.
#[derive(Clone, Default)]
pub struct MemoryClient {
    store: Store,
}

impl MemoryClient {
    pub fn new() -> MemoryClient {
        MemoryClient {
            store: Store::new(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

#[async_trait]
impl StoreClient for MemoryClient {
    async fn execute(&self, cmd: Command) -> Result<Frame> {
        debug!(command = cmd.name(), "executing");
        Ok(cmd.exec(&mut self.store.lock()))
    }

    async fn pipeline(&self, cmds: Vec<Command>) -> Result<Vec<Frame>> {
        debug!(commands = cmds.len(), "executing pipeline");
        let mut store = self.store.lock();
        Ok(cmds.into_iter().map(|cmd| cmd.exec(&mut store)).collect())
    }
}

impl fmt::Debug for MemoryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryClient {{ keys: {} }}", self.store.lock().size())
    }
}

/// A client for a live Redis-compatible server.
///
/// Pipelines are sent inside `MULTI`/`EXEC`. A command the server rejects while running `EXEC`
/// comes back as an error frame in its own slot. A transaction the server refuses to run at
/// all, or a reply that is not one entry per command, fails the batch.
#[derive(Clone)]
pub struct RedisClient {
    conn: MultiplexedConnection,
}

impl RedisClient {
    pub async fn connect(
        info: impl IntoConnectionInfo,
        dial_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self> {
        let client = redis::Client::open(info)?;
        let config = AsyncConnectionConfig::new()
            .set_connection_timeout(dial_timeout)
            .set_response_timeout(read_timeout);
        let conn = client
            .get_multiplexed_async_connection_with_config(&config)
            .await?;
        info!("Connected to Redis server");

        Ok(RedisClient { conn })
    }

    pub fn from_connection(conn: MultiplexedConnection) -> Self {
        RedisClient { conn }
    }
}

#[async_trait]
impl StoreClient for RedisClient {
    async fn execute(&self, cmd: Command) -> Result<Frame> {
        debug!(command = cmd.name(), "sending");
        let mut conn = self.conn.clone();
        let value = conn.req_packed_command(&cmd.to_cmd()).await?;
        Ok(Frame::from(value))
    }

    async fn pipeline(&self, cmds: Vec<Command>) -> Result<Vec<Frame>> {
        debug!(commands = cmds.len(), "sending pipeline");
        if cmds.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for cmd in &cmds {
            pipe.add_command(cmd.to_cmd());
        }

        let mut conn = self.conn.clone();
        // Skip the replies to MULTI and to each QUEUED command; keep only EXEC's.
        let mut replies = conn.req_packed_commands(&pipe, cmds.len() + 1, 1).await?;
        match replies.pop() {
            Some(redis::Value::Array(values)) if values.len() == cmds.len() => {
                Ok(values.into_iter().map(Frame::from).collect())
            }
            Some(redis::Value::Nil) => Err(Error::Transport("transaction aborted".to_string())),
            reply => {
                warn!(?reply, "unexpected reply to EXEC");
                Err(Error::Transport(format!(
                    "unexpected reply to EXEC for {} commands",
                    cmds.len()
                )))
            }
        }
    }
}

impl fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedisClient")
    }
}
