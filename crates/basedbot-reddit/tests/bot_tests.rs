//! Supervised workers against the in-memory forum

use basedbot_core::{ForumError, MemoryForum, StreamItem, StreamKind, WorkerConfig, REPLY_TEXT};
use basedbot_reddit::spawn_workers;
use basedbot_supervisor::{ChildExit, Supervisor, SupervisorConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

async fn wait_for_replies(forum: &MemoryForum, count: usize) {
    for _ in 0..500 {
        if forum.replies().await.len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {count} replies, got {:?}", forum.replies().await);
}

#[tokio::test]
async fn test_both_workers_reply() {
    let forum = Arc::new(MemoryForum::new());
    let mut supervisor = Supervisor::new(SupervisorConfig::default(), CancellationToken::new());
    let workers = spawn_workers(&mut supervisor, forum.clone(), "4chan", &WorkerConfig::default()).unwrap();

    assert_eq!(supervisor.children(), vec!["comments".to_string(), "posts".to_string()]);

    forum.publish(StreamItem::comment("t1_b", "I am based in reality"));
    forum.publish(StreamItem::comment("t1_a", "that take is based af"));
    forum.publish(StreamItem::post("t3_a", "Daily thread", "op is based honestly"));
    wait_for_replies(&forum, 2).await;

    let exits = supervisor.shutdown().await;
    assert!(exits.iter().all(|(_, exit)| *exit == ChildExit::Cancelled));

    let mut replied: Vec<_> = forum
        .replies()
        .await
        .into_iter()
        .map(|r| {
            assert_eq!(r.text, REPLY_TEXT);
            r.item.to_string()
        })
        .collect();
    replied.sort();
    assert_eq!(replied, vec!["t1_a", "t3_a"]);

    let seen: u64 = workers.iter().map(|w| w.stats().seen()).sum();
    assert_eq!(seen, 3);
}

#[tokio::test]
async fn test_stream_failure_restarts_only_that_worker() {
    let forum = Arc::new(MemoryForum::new());
    let mut supervisor = Supervisor::new(SupervisorConfig::default(), CancellationToken::new());
    spawn_workers(&mut supervisor, forum.clone(), "4chan", &WorkerConfig::default()).unwrap();

    forum.fail_stream(StreamKind::Comments, ForumError::Network("connection reset".into()));
    forum.publish(StreamItem::comment("t1_a", "based af"));
    wait_for_replies(&forum, 1).await;

    let comments = supervisor.stats("comments").unwrap();
    assert_eq!(comments.failures, 1);
    assert_eq!(comments.starts, 2);
    assert!(comments
        .last_error
        .as_deref()
        .is_some_and(|e| e.contains("connection reset")));

    let posts = supervisor.stats("posts").unwrap();
    assert_eq!(posts.failures, 0);
    assert_eq!(posts.starts, 1);

    supervisor.shutdown().await;

    // Each pass opened a fresh subscription
    let comment_subscriptions = forum
        .subscriptions()
        .await
        .into_iter()
        .filter(|(kind, forum)| *kind == StreamKind::Comments && forum == "4chan")
        .count();
    assert_eq!(comment_subscriptions, 2);
}

#[tokio::test]
async fn test_reply_failure_restarts_worker() {
    let forum = Arc::new(MemoryForum::new());
    forum
        .fail_next_reply(ForumError::RateLimited { retry_after: None })
        .await;

    let mut supervisor = Supervisor::new(SupervisorConfig::default(), CancellationToken::new());
    spawn_workers(&mut supervisor, forum.clone(), "4chan", &WorkerConfig::default()).unwrap();

    forum.publish(StreamItem::comment("t1_a", "based af"));
    forum.publish(StreamItem::comment("t1_b", "based fr"));
    wait_for_replies(&forum, 1).await;
    supervisor.shutdown().await;

    let replies = forum.replies().await;
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].item.as_str(), "t1_b");
    assert_eq!(supervisor.stats("comments").unwrap().failures, 1);
}
