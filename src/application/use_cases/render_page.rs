// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::models::task::{CrawlResult, CrawlTask};
use crate::engines::session::CrawlSession;
use crate::engines::traits::{EngineDriver, NavigateOptions};
use crate::infrastructure::result_sink::ResultSink;
use crate::utils::errors::WorkerError;

/// 渲染页面用例
///
/// 每个任务新建一个抓取会话，渲染成功后交给结果写入器落盘
#[derive(Clone)]
pub struct RenderPageUseCase {
    driver: Arc<dyn EngineDriver>,
    options: NavigateOptions,
    sink: ResultSink,
}

impl RenderPageUseCase {
    pub fn new(driver: Arc<dyn EngineDriver>, options: NavigateOptions, sink: ResultSink) -> Self {
        Self {
            driver,
            options,
            sink,
        }
    }

    /// 执行渲染并保存
    ///
    /// # 返回值
    ///
    /// * `Ok(CrawlResult)` - 来源地址与文件名的映射
    /// * `Err(WorkerError)` - 渲染或写入失败
    #[instrument(skip(self, task), fields(uri = %task.uri, engine = self.driver.name()))]
    pub async fn execute(&self, task: CrawlTask) -> Result<CrawlResult, WorkerError> {
        let mut session = CrawlSession::new(self.driver.clone(), self.options.clone());
        let html = session.capture(&task.uri).await?;
        debug!(bytes = html.len(), "Page captured");

        Ok(self.sink.store(&task.uri, &html).await?)
    }
}
