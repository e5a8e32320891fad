// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 消费循环测试模块
///
/// 使用内存消息流代替 JetStream，验证逐条处理、错误跳过与停止信号
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use renderq::engines::scripted_engine::ScriptedEngine;
use renderq::infrastructure::storage::InMemoryStorage;
use renderq::queue::nats_client::consume;

use crate::helpers::mock_delivery::{ack_count, CountingDelivery};
use crate::helpers::mock_storage::FetchObservingStorage;
use crate::helpers::{scripted_dispatcher, RENDERED_HTML};

#[tokio::test]
async fn test_consume_handles_every_message_and_skips_stream_errors() {
    let engine = ScriptedEngine::new(RENDERED_HTML);
    let storage = Arc::new(InMemoryStorage::new());
    let dispatcher = Arc::new(scripted_dispatcher(&engine, storage.clone()));

    let (first, first_acks) = CountingDelivery::task("https://example.com/1");
    let (garbage, garbage_acks) = CountingDelivery::new("{{{");
    let (second, second_acks) = CountingDelivery::task("https://example.com/2");
    let messages = futures::stream::iter(vec![
        Ok(first),
        Err("connection hiccup".to_string()),
        Ok(garbage),
        Ok(second),
    ]);

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    consume(messages, dispatcher, shutdown_rx).await;

    assert_eq!(ack_count(&first_acks), 1);
    assert_eq!(ack_count(&garbage_acks), 1);
    assert_eq!(ack_count(&second_acks), 1);
    assert_eq!(storage.len().await, 2);
}

#[tokio::test]
async fn test_consume_exits_immediately_when_already_stopped() {
    let engine = ScriptedEngine::new(RENDERED_HTML);
    let dispatcher = Arc::new(scripted_dispatcher(&engine, Arc::new(InMemoryStorage::new())));
    let (delivery, acks) = CountingDelivery::task("https://example.com");

    let (_shutdown_tx, shutdown_rx) = watch::channel(true);
    consume(
        futures::stream::iter(vec![Ok::<_, String>(delivery)]),
        dispatcher,
        shutdown_rx,
    )
    .await;

    assert_eq!(ack_count(&acks), 0);
    assert!(engine.recorded().is_empty());
}

#[tokio::test]
async fn test_consume_stops_on_signal_while_idle() {
    let engine = ScriptedEngine::new(RENDERED_HTML);
    let dispatcher = Arc::new(scripted_dispatcher(&engine, Arc::new(InMemoryStorage::new())));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let messages = futures::stream::pending::<Result<CountingDelivery, String>>();
    let handle = tokio::spawn(consume(messages, dispatcher, shutdown_rx));

    shutdown_tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("consume loop did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_consume_fetches_next_message_only_after_handling() {
    let fetched = Arc::new(AtomicUsize::new(0));
    let storage = Arc::new(FetchObservingStorage::new(fetched.clone()));
    let engine = ScriptedEngine::new(RENDERED_HTML);
    let dispatcher = Arc::new(scripted_dispatcher(&engine, storage.clone()));

    // 消息在被取出时才计数，和按需拉取的消息流一致
    let counter = fetched.clone();
    let messages = futures::stream::iter([
        "https://example.com/1",
        "https://example.com/2",
        "https://example.com/3",
    ])
    .map(move |uri| {
        counter.fetch_add(1, Ordering::SeqCst);
        let (delivery, _acks) = CountingDelivery::task(uri);
        Ok::<_, String>(delivery)
    });

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    consume(messages, dispatcher, shutdown_rx).await;

    // 处理第 k 条时只取出了 k 条
    assert_eq!(storage.observed(), vec![1, 2, 3]);
    assert_eq!(fetched.load(Ordering::SeqCst), 3);
}
