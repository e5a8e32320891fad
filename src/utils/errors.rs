// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::ConfigError;
use thiserror::Error;

use crate::domain::repositories::storage_repository::StorageError;
use crate::engines::traits::EngineError;
use crate::queue::delivery::QueueError;

/// Worker错误类型
///
/// 单个任务范围内的错误，只影响当前消息，不会终止进程
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Undecodable payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Crawl failed: {0}")]
    Crawl(#[from] EngineError),

    #[error("Store failed: {0}")]
    Store(#[from] StorageError),

    #[error("Pipeline aborted: {0}")]
    Aborted(String),
}

/// 启动错误类型
///
/// 仅在启动阶段出现，会使进程以非零状态退出
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
