// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use crate::queue::delivery::QueueError;
use crate::queue::nats_client::{NatsQueueClient, Subscription};
use crate::workers::dispatcher::TaskDispatcher;

/// 工作管理器
///
/// 启动分两段：`start` 建立订阅（失败即启动失败），
/// `run_until_shutdown` 阻塞到收到停止信号
pub struct WorkerManager {
    client: NatsQueueClient,
    dispatcher: Arc<TaskDispatcher>,
    ack_wait: Duration,
    subscription: Option<Subscription>,
}

impl WorkerManager {
    pub fn new(client: NatsQueueClient, dispatcher: Arc<TaskDispatcher>, ack_wait: Duration) -> Self {
        Self {
            client,
            dispatcher,
            ack_wait,
            subscription: None,
        }
    }

    /// 订阅任务队列
    pub async fn start(&mut self) -> Result<(), QueueError> {
        let subscription = self
            .client
            .subscribe(self.dispatcher.clone(), self.ack_wait)
            .await?;
        self.subscription = Some(subscription);
        Ok(())
    }

    /// 等待关闭信号并停止消费
    ///
    /// 正在处理的消息会先完成并确认
    pub async fn run_until_shutdown(mut self) {
        wait_for_shutdown_signal().await;

        info!("Shutting down worker...");
        if let Some(subscription) = self.subscription.take() {
            subscription.shutdown().await;
        }
        self.client.close().await;

        info!("Worker shut down successfully");
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        let mut terminate = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(err) => {
                error!("Unable to listen for SIGTERM: {}", err);
                return wait_for_ctrl_c().await;
            }
        };

        tokio::select! {
            _ = wait_for_ctrl_c() => {}
            _ = terminate.recv() => info!("SIGTERM received"),
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }
}
