use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::{self, Duration};
use typedis::{Accessor, Error, Hints, MemoryClient, RankingBoard, Registry, UpsertKind};

fn board(parts: &[&str]) -> RankingBoard {
    let mut registry = Registry::new();
    registry
        .insert("default", "test", Arc::new(MemoryClient::new()))
        .unwrap();
    Accessor::new(registry)
        .ranking_board(&Hints::new(), parts)
        .unwrap()
}

async fn seeded() -> RankingBoard {
    let board = board(&["test_ranking"]);
    board
        .upsert_multi(
            &[
                ("member1", 1.0),
                ("member2", 2.0),
                ("member3", 2.0),
                ("member4", 4.0),
                ("member5", 5.0),
            ],
            UpsertKind::GreaterThan,
        )
        .await
        .unwrap();
    board
}

#[tokio::test]
async fn test_board_id() {
    assert_eq!(board(&["test_ranking"]).id(), "test.test_ranking");
    assert_eq!(board(&["weekly", "2024", "07"]).id(), "test.weekly_2024_07");
}

#[tokio::test]
async fn test_conditional_upsert() {
    let board = board(&["upsert"]);

    board.upsert("m", 5.0, UpsertKind::GreaterThan).await.unwrap();

    board.upsert("m", 3.0, UpsertKind::GreaterThan).await.unwrap();
    assert_eq!(board.score("m").await, Ok(5.0));

    board.upsert("m", 3.0, UpsertKind::LessThan).await.unwrap();
    assert_eq!(board.score("m").await, Ok(3.0));

    board.upsert("new", 1.0, UpsertKind::GreaterThan).await.unwrap();
    assert_eq!(board.score("new").await, Ok(1.0));

    board
        .upsert_multi(&[("m", 10.0), ("other", 7.0)], UpsertKind::LessThan)
        .await
        .unwrap();
    assert_eq!(
        board.scores(&["m", "other"]).await,
        Ok(HashMap::from([
            ("m".to_string(), 3.0),
            ("other".to_string(), 7.0)
        ]))
    );
}

#[tokio::test]
async fn test_top_descending() {
    let board = seeded().await;

    assert_eq!(
        board.top(2, true).await,
        Ok(vec![("member5".to_string(), 5.0), ("member4".to_string(), 4.0)])
    );
}

#[tokio::test]
async fn test_top_ascending() {
    let board = seeded().await;

    let top = board.top(2, false).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0], ("member1".to_string(), 1.0));
    // member2 and member3 tie at 2; either may come second.
    assert_eq!(top[1].1, 2.0);
    assert!(["member2", "member3"].contains(&top[1].0.as_str()));
}

#[tokio::test]
async fn test_top_edges() {
    let board = seeded().await;

    assert_eq!(board.top(0, true).await, Ok(vec![]));
    assert_eq!(board.top(100, true).await.unwrap().len(), 5);

    let missing = self::board(&["never_written"]);
    assert_eq!(missing.top(3, true).await, Ok(vec![]));
}

#[tokio::test]
async fn test_incr_by() {
    let board = seeded().await;

    assert_eq!(board.incr_by("member1", 0.5).await, Ok(1.5));
    assert_eq!(board.incr_by("fresh", -2.0).await, Ok(-2.0));
}

#[tokio::test]
async fn test_incr_by_multi() {
    let board = board(&["incr"]);
    board
        .upsert("m5", 5.0, UpsertKind::GreaterThan)
        .await
        .unwrap();

    let scores = board
        .incr_by_multi(&[("m1", 1.0), ("m5", 5.0)])
        .await
        .unwrap();
    assert_eq!(
        scores,
        HashMap::from([("m1".to_string(), 1.0), ("m5".to_string(), 10.0)])
    );
}

#[tokio::test]
async fn test_scores() {
    let board = seeded().await;

    assert_eq!(
        board.scores(&["member1", "member3", "never-added"]).await,
        Ok(HashMap::from([
            ("member1".to_string(), 1.0),
            ("member3".to_string(), 2.0),
            ("never-added".to_string(), 0.0),
        ]))
    );
    assert_eq!(board.score("never-added").await, Ok(0.0));
}

#[tokio::test]
async fn test_remove_and_delete() {
    let board = seeded().await;

    assert_eq!(board.remove("member5").await, Ok(true));
    assert_eq!(
        board.top(1, true).await,
        Ok(vec![("member4".to_string(), 4.0)])
    );

    assert_eq!(board.delete().await, Ok(true));
    assert_eq!(board.top(10, true).await, Ok(vec![]));
}

#[tokio::test]
async fn test_expire() {
    time::pause();
    let board = seeded().await;

    assert_eq!(board.expire(Duration::from_secs(30 * 60)).await, Ok(true));

    time::advance(Duration::from_secs(30 * 60 + 1)).await;
    assert_eq!(board.top(10, true).await, Ok(vec![]));
}

#[tokio::test]
async fn test_timeout_hint_is_inherited() {
    let mut registry = Registry::new();
    registry
        .insert("default", "test", Arc::new(MemoryClient::new()))
        .unwrap();
    let hints = Hints::new().timeout(Duration::from_secs(1));

    // The memory store answers right away, well inside the deadline.
    let board = registry.ranking_board(&hints, &["deadline"]).unwrap();
    assert_eq!(board.incr_by("m", 1.0).await, Ok(1.0));

    let none: [&str; 0] = [];
    assert!(matches!(
        registry.ranking_board(&hints, &none),
        Err(Error::InvalidArgument(_))
    ));
}
