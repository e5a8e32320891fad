// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 真实组件测试
///
/// 需要本地 Chromium 和 JetStream 已启用的 NATS 服务器，默认忽略。
/// NATS 地址从 RENDERQ_TEST_NATS_HOST / RENDERQ_TEST_NATS_PORT 读取
use async_nats::jetstream;
use std::sync::Arc;
use std::time::Duration;

use renderq::application::use_cases::render_page::RenderPageUseCase;
use renderq::config::settings::{NatsSettings, Settings};
use renderq::domain::models::task::CrawlTask;
use renderq::engines::chromium_engine::ChromiumEngine;
use renderq::engines::scripted_engine::ScriptedEngine;
use renderq::engines::traits::NavigateOptions;
use renderq::infrastructure::result_sink::ResultSink;
use renderq::infrastructure::storage::LocalStorage;
use renderq::queue::nats_client::NatsQueueClient;

use crate::helpers::{scripted_dispatcher, RENDERED_HTML};

fn nats_settings() -> NatsSettings {
    NatsSettings {
        endpoint: std::env::var("RENDERQ_TEST_NATS_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
        port: std::env::var("RENDERQ_TEST_NATS_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(4222),
        subject: format!("renderq.test.{}", uuid::Uuid::new_v4().simple()),
        queue_group: "renderq-test".to_string(),
        stream: None,
    }
}

#[tokio::test]
#[ignore = "requires a local Chromium installation"]
async fn test_chromium_renders_real_page() {
    let tmp = tempfile::tempdir().unwrap();
    let settings = Settings::from_builder(Settings::defaults().unwrap()).unwrap();

    let use_case = RenderPageUseCase::new(
        Arc::new(ChromiumEngine::new(settings.engine.clone())),
        NavigateOptions::from(&settings.engine),
        ResultSink::new(Arc::new(LocalStorage::new(tmp.path()))),
    );

    let result = use_case
        .execute(CrawlTask::new("https://example.com"))
        .await
        .unwrap();

    let html = std::fs::read_to_string(tmp.path().join(&result.artifact_name)).unwrap();
    assert!(html.contains("Example Domain"));
}

#[tokio::test]
#[ignore = "requires a NATS server with JetStream enabled"]
async fn test_jetstream_task_is_consumed_and_stored() {
    let tmp = tempfile::tempdir().unwrap();
    let settings = nats_settings();

    // 准备流
    let publisher = async_nats::connect(settings.url().as_str()).await.unwrap();
    let js = jetstream::new(publisher.clone());
    let stream_name = format!("RENDERQ_TEST_{}", uuid::Uuid::new_v4().simple());
    js.get_or_create_stream(jetstream::stream::Config {
        name: stream_name.clone(),
        subjects: vec![settings.subject.clone()],
        ..Default::default()
    })
    .await
    .unwrap();

    let engine = ScriptedEngine::new(RENDERED_HTML);
    let dispatcher = Arc::new(scripted_dispatcher(
        &engine,
        Arc::new(LocalStorage::new(tmp.path())),
    ));
    let client = NatsQueueClient::connect(&settings).await.unwrap();
    let subscription = client
        .subscribe(dispatcher, Duration::from_secs(30))
        .await
        .unwrap();

    let payload = CrawlTask::new("https://example.com").encode().unwrap();
    js.publish(settings.subject.clone(), payload.into())
        .await
        .unwrap()
        .await
        .unwrap();

    let mut stored = 0;
    for _ in 0..50 {
        stored = std::fs::read_dir(tmp.path()).unwrap().count();
        if stored > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    subscription.shutdown().await;
    client.close().await;
    js.delete_stream(&stream_name).await.unwrap();

    assert_eq!(stored, 1);
}
