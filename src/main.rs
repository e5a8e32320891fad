// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use renderq::application::use_cases::render_page::RenderPageUseCase;
use renderq::config::settings::{BrowserFamily, Settings};
use renderq::engines::chromium_engine::ChromiumEngine;
use renderq::engines::traits::{EngineDriver, NavigateOptions};
use renderq::infrastructure::result_sink::ResultSink;
use renderq::infrastructure::storage::{ensure_runtime_dir, LocalStorage};
use renderq::queue::nats_client::{ack_wait_for, NatsQueueClient};
use renderq::utils::errors::StartupError;
use renderq::utils::telemetry;
use renderq::workers::dispatcher::TaskDispatcher;
use renderq::workers::manager::WorkerManager;
use std::sync::Arc;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动 worker
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Arc::new(Settings::new().map_err(StartupError::from)?);

    // 2. Initialize logging
    telemetry::init_telemetry(&settings.log);
    info!("Starting renderq...");

    // 3. Connect to broker
    let client = NatsQueueClient::connect(&settings.nats_server)
        .await
        .map_err(StartupError::from)?;

    // 4. Check artifact directory
    ensure_runtime_dir(&settings.storage.runtime_dir)
        .await
        .map_err(StartupError::from)?;
    info!(path = %settings.storage.runtime_dir.display(), "Runtime directory ready");

    // 5. Initialize components
    let storage = Arc::new(LocalStorage::new(settings.storage.runtime_dir.clone()));
    let sink = ResultSink::new(storage);

    let driver: Arc<dyn EngineDriver> = match settings.engine.family {
        BrowserFamily::Chromium => Arc::new(ChromiumEngine::new(settings.engine.clone())),
    };
    info!(engine = driver.name(), "Browser engine configured");

    let use_case = RenderPageUseCase::new(driver, NavigateOptions::from(&settings.engine), sink);
    let dispatcher = Arc::new(TaskDispatcher::new(use_case));

    // 6. Subscribe and run
    let mut manager = WorkerManager::new(client, dispatcher, ack_wait_for(&settings.engine));
    manager.start().await.map_err(StartupError::from)?;
    info!("Worker started");

    manager.run_until_shutdown().await;

    Ok(())
}
