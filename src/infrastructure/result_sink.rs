// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::models::task::{CrawlResult, ARTIFACT_EXTENSION};
use crate::domain::repositories::storage_repository::{StorageError, StorageRepository};

/// 结果写入器
///
/// 每次写入生成新的 UUID v4 作为文件名，写入失败不重试，直接交给调度器处理
#[derive(Clone)]
pub struct ResultSink {
    storage: Arc<dyn StorageRepository>,
}

impl ResultSink {
    pub fn new(storage: Arc<dyn StorageRepository>) -> Self {
        Self { storage }
    }

    /// 保存渲染后的页面内容
    ///
    /// # 参数
    ///
    /// * `source_uri` - 来源地址
    /// * `content` - 渲染后的 HTML
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlResult)` - 来源地址与文件名的映射
    /// * `Err(StorageError)` - 写入失败
    pub async fn store(&self, source_uri: &str, content: &str) -> Result<CrawlResult, StorageError> {
        let artifact_name = format!("{}.{}", Uuid::new_v4(), ARTIFACT_EXTENSION);
        self.storage.save(&artifact_name, content.as_bytes()).await?;
        debug!(artifact = %artifact_name, bytes = content.len(), "Artifact written");

        Ok(CrawlResult {
            source_uri: source_uri.to_string(),
            artifact_name,
        })
    }
}
