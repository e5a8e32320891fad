// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing::{error, info, instrument, warn};

use crate::application::use_cases::render_page::RenderPageUseCase;
use crate::domain::models::task::{CrawlResult, CrawlTask};
use crate::queue::delivery::Delivery;
use crate::utils::errors::WorkerError;

/// 单条消息的处理结果
#[derive(Debug)]
pub enum Outcome {
    /// 页面已渲染并保存
    Stored(CrawlResult),
    /// 负载无法解码，未执行渲染
    Undecodable,
    /// 渲染或保存失败
    Failed(WorkerError),
}

/// 任务调度器
///
/// 解码消息、执行渲染流程，并且无论结果如何都恰好确认一次消息。
/// 渲染流程在独立的 Tokio 任务中运行，其中的 panic 只会让当前任务失败
pub struct TaskDispatcher {
    use_case: RenderPageUseCase,
}

impl TaskDispatcher {
    pub fn new(use_case: RenderPageUseCase) -> Self {
        Self { use_case }
    }

    /// 处理一条消息
    #[instrument(skip_all)]
    pub async fn handle<D>(&self, delivery: D) -> Outcome
    where
        D: Delivery + 'static,
    {
        let payload = String::from_utf8_lossy(delivery.payload()).into_owned();
        let decoded = CrawlTask::decode(delivery.payload());

        let outcome = match decoded {
            Ok(task) => self.run(task, &payload).await,
            Err(e) => {
                error!(
                    payload = %payload,
                    error = %e,
                    "Failed to decode crawl task"
                );
                Outcome::Undecodable
            }
        };

        // 唯一的确认点：确认失败只记录，不重试
        if let Err(e) = delivery.ack().await {
            warn!(error = %e, "Failed to acknowledge message");
        }

        outcome
    }

    async fn run(&self, task: CrawlTask, payload: &str) -> Outcome {
        let uri = task.uri.clone();
        let use_case = self.use_case.clone();

        match tokio::spawn(async move { use_case.execute(task).await }).await {
            Ok(Ok(result)) => {
                info!(uri = %result.source_uri, artifact = %result.artifact_name, "Page stored");
                Outcome::Stored(result)
            }
            Ok(Err(e)) => {
                error!(
                    uri = %uri,
                    payload = %payload,
                    error = %e,
                    "Crawl task failed"
                );
                Outcome::Failed(e)
            }
            Err(join_error) => {
                let e = WorkerError::Aborted(join_error.to_string());
                error!(
                    uri = %uri,
                    payload = %payload,
                    error = %e,
                    "Crawl task aborted"
                );
                Outcome::Failed(e)
            }
        }
    }
}
