// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use renderq::queue::delivery::{Delivery, QueueError};

/// 记录确认次数的消息
pub struct CountingDelivery {
    payload: Vec<u8>,
    acks: Arc<AtomicUsize>,
    fail_ack: bool,
}

impl CountingDelivery {
    pub fn new(payload: impl Into<Vec<u8>>) -> (Self, Arc<AtomicUsize>) {
        let acks = Arc::new(AtomicUsize::new(0));
        (
            Self {
                payload: payload.into(),
                acks: acks.clone(),
                fail_ack: false,
            },
            acks,
        )
    }

    pub fn task(uri: &str) -> (Self, Arc<AtomicUsize>) {
        Self::new(format!(r#"{{"uri":"{}"}}"#, uri))
    }

    /// 确认时返回错误（仍计数）
    pub fn failing_ack(mut self) -> Self {
        self.fail_ack = true;
        self
    }
}

#[async_trait]
impl Delivery for CountingDelivery {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    async fn ack(self) -> Result<(), QueueError> {
        self.acks.fetch_add(1, Ordering::SeqCst);
        if self.fail_ack {
            return Err(QueueError::Ack("broker went away".to_string()));
        }
        Ok(())
    }
}

pub fn ack_count(acks: &Arc<AtomicUsize>) -> usize {
    acks.load(Ordering::SeqCst)
}
