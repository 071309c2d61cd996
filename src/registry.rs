use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use itertools::Itertools;
use tracing::info;

use crate::client::{RedisClient, StoreClient};
use crate::commands::Command;
use crate::config::ConnectionConfig;
use crate::frame::Frame;
use crate::hints::Hints;
use crate::keys::KeyNamer;
use crate::ranking::RankingBoard;
use crate::{Error, Result};

/// One named connection: its key namespace and the client commands go through.
///
/// Cloning is cheap, the client is shared.
#[derive(Clone)]
pub struct Connection {
    name: String,
    namer: KeyNamer,
    client: Arc<dyn StoreClient>,
}

impl Connection {
    pub fn new(
        name: impl Into<String>,
        prefix: impl Into<String>,
        client: Arc<dyn StoreClient>,
    ) -> Result<Connection> {
        Ok(Connection {
            name: name.into(),
            namer: KeyNamer::new(prefix)?,
            client,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namer(&self) -> &KeyNamer {
        &self.namer
    }

    /// Sends one command, bounded by `timeout` when given.
    pub async fn execute(
        &self,
        cmd: impl Into<Command>,
        timeout: Option<Duration>,
    ) -> Result<Frame> {
        with_deadline(timeout, self.client.execute(cmd.into())).await
    }

    /// Sends `cmds` as one atomic batch, bounded by `timeout` when given. The reply count is
    /// checked, so callers can pair replies with their commands positionally.
    pub async fn pipeline(
        &self,
        cmds: Vec<Command>,
        timeout: Option<Duration>,
    ) -> Result<Vec<Frame>> {
        let sent = cmds.len();
        let replies = with_deadline(timeout, self.client.pipeline(cmds)).await?;
        if replies.len() != sent {
            return Err(Error::Transport(format!(
                "protocol error; sent {} commands, got {} replies",
                sent,
                replies.len()
            )));
        }
        Ok(replies)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("prefix", &self.namer.prefix())
            .finish()
    }
}

async fn with_deadline<T>(
    timeout: Option<Duration>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, fut).await?,
        None => fut.await,
    }
}

/// Named connections, created once at startup and handed to the accessor and ranking boards.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    connections: HashMap<String, Connection>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Connects every config concurrently. The first failure aborts the whole open.
    pub async fn open(configs: Vec<ConnectionConfig>) -> Result<Registry> {
        let connections = try_join_all(configs.into_iter().map(|config| async move {
            let namer = KeyNamer::new(config.key_prefix.clone())?;
            let client = RedisClient::connect(
                config.connection_info()?,
                config.dial_timeout,
                config.read_timeout,
            )
            .await?;
            info!(connection = %config.name, "{}", config.summary());

            Ok::<_, Error>(Connection {
                name: config.name,
                namer,
                client: Arc::new(client),
            })
        }))
        .await?;

        let mut registry = Registry::new();
        for connection in connections {
            registry
                .connections
                .insert(connection.name.clone(), connection);
        }
        Ok(registry)
    }

    /// Registers `client` under `name`, replacing any connection of the same name.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        prefix: impl Into<String>,
        client: Arc<dyn StoreClient>,
    ) -> Result<()> {
        let connection = Connection::new(name, prefix, client)?;
        self.connections
            .insert(connection.name.clone(), connection);
        Ok(())
    }

    pub fn connection(&self, name: &str) -> Result<&Connection> {
        self.connections.get(name).ok_or_else(|| {
            Error::InvalidArgument(format!("connection {name:?} is not open"))
        })
    }

    /// The connection selected by the call's hints.
    pub fn resolve(&self, hints: &Hints) -> Result<&Connection> {
        self.connection(hints.connection_or_default())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str).sorted()
    }

    /// A board whose id is the connection prefix followed by `parts` joined with `_`.
    pub fn ranking_board<S: AsRef<str>>(&self, hints: &Hints, parts: &[S]) -> Result<RankingBoard> {
        if parts.is_empty() {
            return Err(Error::InvalidArgument("ranking board needs an id".to_string()));
        }
        let connection = self.resolve(hints)?;
        let parts: Vec<&str> = parts.iter().map(|part| part.as_ref()).collect();
        let id = connection.namer.qualify_one(&parts.join("_"))?;

        Ok(RankingBoard::new(id, connection.clone(), hints.timeout))
    }
}
