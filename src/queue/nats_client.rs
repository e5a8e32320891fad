// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_nats::jetstream::consumer::{pull, AckPolicy, PullConsumer};
use async_nats::jetstream;
use async_nats::{Client, ConnectOptions, Event};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::settings::{EngineSettings, NatsSettings};
use crate::queue::delivery::{Delivery, QueueError};
use crate::utils::retry_policy::ReconnectPolicy;
use crate::workers::dispatcher::TaskDispatcher;

/// 连接断开后的最大重连次数
const MAX_RECONNECTS: usize = 20;
/// 每次重连之间的固定等待时间
const RECONNECT_WAIT: Duration = Duration::from_secs(5);
/// ack_wait 在单任务最长耗时之上的余量
const ACK_WAIT_MARGIN: Duration = Duration::from_secs(60);
/// 单次拉取请求在服务器端的存活时间，到期无消息则重新拉取
const FETCH_EXPIRY: Duration = Duration::from_secs(30);
/// 拉取失败后的等待时间
const FETCH_RETRY_DELAY: Duration = Duration::from_secs(1);

/// 服务器判定消息超时重投之前的等待时间
///
/// 必须长于一次渲染可能花费的最长时间，避免仍在处理的消息被重投
pub fn ack_wait_for(engine: &EngineSettings) -> Duration {
    engine.task_budget() + ACK_WAIT_MARGIN
}

/// NATS JetStream 队列客户端
pub struct NatsQueueClient {
    client: Client,
    settings: NatsSettings,
}

impl NatsQueueClient {
    /// 连接消息服务器
    ///
    /// 首次连接失败时按固定间隔重试，次数耗尽后返回错误
    pub async fn connect(settings: &NatsSettings) -> Result<Self, QueueError> {
        let url = settings.url();
        let policy = ReconnectPolicy {
            max_attempts: MAX_RECONNECTS as u32,
            delay: RECONNECT_WAIT,
        };

        let client = policy
            .retry("nats connect", || connect_options().connect(url.as_str()))
            .await
            .map_err(|e| QueueError::Connect(format!("{}: {}", url, e)))?;

        info!(url = %url, "Connected to NATS server");
        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    /// 订阅任务主题并启动消费循环
    ///
    /// 以队列组名作为共享的持久化拉取消费者，同组的多个 worker 分摊消息。
    /// 每次只拉取一条，处理完成后才拉取下一条，本地不缓存未开始的消息
    pub async fn subscribe(
        &self,
        dispatcher: Arc<TaskDispatcher>,
        ack_wait: Duration,
    ) -> Result<Subscription, QueueError> {
        let subject = self.settings.subject.clone();
        let queue_group = self.settings.queue_group.clone();
        let js = jetstream::new(self.client.clone());

        let stream_name = match &self.settings.stream {
            Some(name) => name.clone(),
            None => js
                .stream_by_subject(subject.clone())
                .await
                .map_err(|e| QueueError::JetStream(format!("no stream for {}: {}", subject, e)))?,
        };
        let stream = js
            .get_stream(&stream_name)
            .await
            .map_err(|e| QueueError::JetStream(format!("stream {}: {}", stream_name, e)))?;

        let consumer: PullConsumer = stream
            .get_or_create_consumer(&queue_group, consumer_config(&queue_group, &subject, ack_wait))
            .await
            .map_err(|e| QueueError::Subscribe(e.to_string()))?;

        let messages = pull_one_at_a_time(consumer);

        info!(
            subject = %subject,
            queue_group = %queue_group,
            stream = %stream_name,
            "Subscribed to crawl tasks"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(consume(messages, dispatcher, shutdown_rx));

        Ok(Subscription {
            shutdown_tx,
            handle,
        })
    }

    /// 刷新未发送的数据（确认消息等）
    pub async fn close(self) {
        if let Err(e) = self.client.flush().await {
            warn!(error = %e, "Failed to flush NATS client");
        }
    }
}

/// 共享拉取消费者的配置
fn consumer_config(queue_group: &str, subject: &str, ack_wait: Duration) -> pull::Config {
    pull::Config {
        durable_name: Some(queue_group.to_string()),
        filter_subject: subject.to_string(),
        ack_policy: AckPolicy::Explicit,
        ack_wait,
        ..Default::default()
    }
}

/// 按需拉取的消息流
///
/// 只有在被轮询时才向服务器请求一条消息，所以 ack_wait 计时总是从处理开始
fn pull_one_at_a_time(
    consumer: PullConsumer,
) -> impl Stream<Item = Result<JetStreamDelivery, QueueError>> + Send {
    futures::stream::unfold(consumer, |consumer| async move {
        loop {
            let fetched = match consumer
                .batch()
                .max_messages(1)
                .expires(FETCH_EXPIRY)
                .messages()
                .await
            {
                Ok(batch) => {
                    futures::pin_mut!(batch);
                    batch.next().await.map(|next| next.map_err(|e| e.to_string()))
                }
                Err(e) => Some(Err(e.to_string())),
            };

            match fetched {
                Some(Ok(message)) => return Some((Ok(JetStreamDelivery { message }), consumer)),
                Some(Err(e)) => {
                    tokio::time::sleep(FETCH_RETRY_DELAY).await;
                    return Some((Err(QueueError::Subscribe(e)), consumer));
                }
                // 拉取请求到期，没有新消息
                None => continue,
            }
        }
    })
}

fn connect_options() -> ConnectOptions {
    ConnectOptions::new()
        .max_reconnects(MAX_RECONNECTS)
        .reconnect_delay_callback(|_attempts| RECONNECT_WAIT)
        .event_callback(|event| async move {
            match event {
                Event::Connected => info!("NATS connection established"),
                Event::Disconnected => warn!("NATS connection lost, reconnecting"),
                Event::Closed => error!("NATS connection closed"),
                other => info!(event = %other, "NATS client event"),
            }
        })
}

/// JetStream 消息
pub struct JetStreamDelivery {
    message: jetstream::Message,
}

#[async_trait]
impl Delivery for JetStreamDelivery {
    fn payload(&self) -> &[u8] {
        &self.message.payload[..]
    }

    async fn ack(self) -> Result<(), QueueError> {
        self.message
            .ack()
            .await
            .map_err(|e| QueueError::Ack(e.to_string()))
    }
}

/// 消费循环
///
/// 一次只处理一条消息：等待调度器处理完成后再拉取下一条。
/// 收到停止信号时，正在处理的消息会先完成确认再退出
pub async fn consume<S, D, E>(
    messages: S,
    dispatcher: Arc<TaskDispatcher>,
    mut shutdown: watch::Receiver<bool>,
) where
    S: Stream<Item = Result<D, E>>,
    D: Delivery + 'static,
    E: Display,
{
    futures::pin_mut!(messages);

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = shutdown.changed() => {
                info!("Stop requested, leaving consume loop");
                break;
            }
            next = messages.next() => match next {
                Some(Ok(delivery)) => {
                    dispatcher.handle(delivery).await;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Failed to receive message");
                }
                None => {
                    info!("Message stream ended");
                    break;
                }
            }
        }
    }
}

/// 订阅句柄
pub struct Subscription {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Subscription {
    /// 停止消费循环并等待其退出
    pub async fn shutdown(self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            error!(error = %e, "Consume loop terminated abnormally");
        }
    }
}
