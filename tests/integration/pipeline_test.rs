// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 消息处理流程集成测试
///
/// 从消息流到磁盘上的结果文件，使用脚本化引擎代替真实浏览器
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use renderq::engines::scripted_engine::ScriptedEngine;
use renderq::infrastructure::storage::{ensure_runtime_dir, LocalStorage};
use renderq::queue::nats_client::consume;

use crate::helpers::mock_delivery::{ack_count, CountingDelivery};
use crate::helpers::{scripted_dispatcher, RENDERED_HTML};

#[tokio::test]
async fn test_mixed_batch_writes_only_successful_pages() {
    let tmp = tempfile::tempdir().unwrap();
    let runtime_dir = tmp.path().join("runtime");
    ensure_runtime_dir(&runtime_dir).await.unwrap();

    let engine = ScriptedEngine::new(RENDERED_HTML);
    let dispatcher = Arc::new(scripted_dispatcher(
        &engine,
        Arc::new(LocalStorage::new(&runtime_dir)),
    ));

    let batch = vec![
        CountingDelivery::task("https://example.com/a"),
        CountingDelivery::new(r#"{"uri":"https://example.com","depth":2}"#),
        CountingDelivery::task("mailto:someone@example.com"),
        CountingDelivery::task("https://example.com/b"),
    ];
    let counters: Vec<_> = batch.iter().map(|(_, acks)| acks.clone()).collect();
    let messages = futures::stream::iter(
        batch
            .into_iter()
            .map(|(delivery, _)| Ok::<_, String>(delivery))
            .collect::<Vec<_>>(),
    );

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    consume(messages, dispatcher, shutdown_rx).await;

    for acks in &counters {
        assert_eq!(ack_count(acks), 1);
    }

    let mut artifacts: Vec<String> = std::fs::read_dir(&runtime_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    artifacts.sort();
    assert_eq!(artifacts.len(), 2);
    for name in &artifacts {
        let stem = name.strip_suffix(".html").unwrap();
        assert!(Uuid::parse_str(stem).is_ok(), "{name}");
        assert_eq!(
            std::fs::read_to_string(runtime_dir.join(name)).unwrap(),
            RENDERED_HTML
        );
    }

    // 只有两个合法任务启动了引擎
    let starts = engine.recorded().iter().filter(|c| **c == "start").count();
    assert_eq!(starts, 2);
}
