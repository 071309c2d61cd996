use std::collections::HashMap;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::debug;
use typedis::codec::parse_duration;
use typedis::{Accessor, ConnectionConfig, Error, Fetched, Hints, Kind, Registry, UpsertKind};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Named connection, configured through the `REDIS_<NAME>_*` variables
    #[arg(short, long, env = "TYPEDIS_CONNECTION", default_value = "default", global = true)]
    connection: String,

    /// Deadline for each store round trip, e.g. `500ms` or `2s`
    #[arg(long, value_parser = parse_duration_arg, global = true)]
    timeout: Option<Duration>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Read one or more keys
    Get {
        #[arg(required = true)]
        keys: Vec<String>,
        /// Structure the keys are stored in: string, hash, list, set or zset
        #[arg(short, long, default_value = "string")]
        kind: Kind,
    },
    /// Write a text value
    Set {
        key: String,
        value: String,
        /// Expire the key after this long, e.g. `10m`
        #[arg(long, value_parser = parse_duration_arg)]
        ttl: Option<Duration>,
    },
    /// Show the leading members of a ranking board
    Top {
        board: String,
        #[arg(short, default_value_t = 10)]
        n: usize,
        /// Lowest scores first
        #[arg(long)]
        asc: bool,
    },
    /// Add to a member's score
    Incr {
        board: String,
        member: String,
        #[arg(allow_hyphen_values = true)]
        delta: f64,
    },
    /// Set a member's score if it beats the current one
    Upsert {
        board: String,
        member: String,
        #[arg(allow_hyphen_values = true)]
        score: f64,
        /// Keep the lower score instead of the higher one
        #[arg(long)]
        lt: bool,
    },
}

fn parse_duration_arg(value: &str) -> Result<Duration, Error> {
    parse_duration(value)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let args = Args::parse();
    let config = ConnectionConfig::from_env(&args.connection)?;
    let accessor = Accessor::new(Registry::open(vec![config]).await?);

    let mut hints = Hints::new().connection(args.connection);
    hints.timeout = args.timeout;

    match args.command {
        Cmd::Get { keys, kind } => {
            let hints = hints.kind(kind);
            match kind {
                Kind::String => print(accessor.get::<String, _>(&hints, &keys).await?),
                Kind::Hash => {
                    print(accessor.get::<HashMap<String, String>, _>(&hints, &keys).await?)
                }
                _ => print(accessor.get::<Vec<String>, _>(&hints, &keys).await?),
            }
        }
        Cmd::Set { key, value, ttl } => {
            accessor.set(&hints, &key, &value, ttl).await?;
            println!("OK");
        }
        Cmd::Top { board, n, asc } => {
            let board = accessor.ranking_board(&hints, &[board])?;
            for (rank, (member, score)) in board.top(n, !asc).await?.into_iter().enumerate() {
                println!("{}) {} {}", rank + 1, member, score);
            }
        }
        Cmd::Incr {
            board,
            member,
            delta,
        } => {
            let board = accessor.ranking_board(&hints, &[board])?;
            println!("{}", board.incr_by(&member, delta).await?);
        }
        Cmd::Upsert {
            board,
            member,
            score,
            lt,
        } => {
            let board = accessor.ranking_board(&hints, &[board])?;
            let kind = if lt {
                UpsertKind::LessThan
            } else {
                UpsertKind::GreaterThan
            };
            board.upsert(&member, score, kind).await?;
            println!("{}", board.score(&member).await?);
        }
    }

    Ok(())
}

fn print<T: serde::Serialize>(fetched: Fetched<T>) {
    let json = match fetched {
        Fetched::One { value, .. } => serde_json::to_string_pretty(&value),
        Fetched::Many(values) => {
            let sorted: std::collections::BTreeMap<_, _> = values.into_iter().collect();
            serde_json::to_string_pretty(&sorted)
        }
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("cannot render result: {e}"),
    }
}
