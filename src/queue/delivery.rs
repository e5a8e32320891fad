// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 无法连接消息服务器
    #[error("Broker connection failed: {0}")]
    Connect(String),

    /// JetStream 上下文或流不可用
    #[error("JetStream error: {0}")]
    JetStream(String),

    /// 创建消费者或订阅失败
    #[error("Subscribe failed: {0}")]
    Subscribe(String),

    /// 确认消息失败
    #[error("Ack failed: {0}")]
    Ack(String),
}

/// 一条待处理的消息
///
/// `ack` 按值消费自身，所以每条消息最多只能确认一次
#[async_trait]
pub trait Delivery: Send {
    /// 原始消息负载
    fn payload(&self) -> &[u8];

    /// 确认消息，告知服务器不再重投
    async fn ack(self) -> Result<(), QueueError>;
}
