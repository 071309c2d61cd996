//! Read-only: a plain value carries no scores, so sorted sets are written through
//! [`RankingBoard`](crate::ranking::RankingBoard).

use std::collections::HashMap;

use crate::adapters::sequence::decode_elements;
use crate::adapters::{read_many, read_one};
use crate::codec::Storable;
use crate::commands::{Command, Zrange};
use crate::hints::Hints;
use crate::registry::Connection;
use crate::Result;

pub async fn get_one<T: Storable>(
    conn: &Connection,
    hints: &Hints,
    key: &str,
) -> Result<Option<T>> {
    read_one(conn, hints, key, reader(hints), decode_elements).await
}

pub async fn get_many<T: Storable>(
    conn: &Connection,
    hints: &Hints,
    keys: &[String],
) -> Result<HashMap<String, Option<T>>> {
    read_many(conn, hints, keys, reader(hints), decode_elements).await
}

/// Members by rank within the hinted range, highest score first unless `reverse` is off.
fn reader(hints: &Hints) -> impl Fn(String) -> Command {
    let (start, stop) = (hints.start_or_default(), hints.stop_or_default());
    let rev = hints.reverse_or_default();

    move |key| {
        Command::from(Zrange {
            key,
            start,
            stop,
            rev,
            with_scores: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryClient;
    use crate::commands::Zadd;
    use std::sync::Arc;

    async fn board() -> Connection {
        let conn = Connection::new("default", "test", Arc::new(MemoryClient::new())).unwrap();
        for (member, score) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
            let zadd = Zadd {
                key: String::from("test.z"),
                member: member.to_string(),
                score,
                condition: None,
            };
            conn.execute(zadd, None).await.unwrap();
        }
        conn
    }

    #[tokio::test]
    async fn highest_first_by_default() {
        let conn = board().await;

        assert_eq!(
            get_one::<Vec<String>>(&conn, &Hints::new(), "z").await,
            Ok(Some(vec!["c".to_string(), "b".to_string(), "a".to_string()]))
        );
    }

    #[tokio::test]
    async fn range_and_order_hints() {
        let conn = board().await;
        let hints = Hints::new().reverse(false).range(0, 1);

        assert_eq!(
            get_one::<Vec<String>>(&conn, &hints, "z").await,
            Ok(Some(vec!["a".to_string(), "b".to_string()]))
        );
    }

    #[tokio::test]
    async fn missing_board_reads_as_none() {
        let conn = board().await;
        let keys = vec!["z".to_string(), "other".to_string()];

        let values = get_many::<Vec<String>>(&conn, &Hints::new(), &keys)
            .await
            .unwrap();
        assert_eq!(values.len(), 2);
        assert!(values["z"].is_some());
        assert_eq!(values["other"], None);
    }
}
