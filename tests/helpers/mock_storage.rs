// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use renderq::domain::repositories::storage_repository::{StorageError, StorageRepository};

/// 写入总是失败的存储
pub struct FailingStorage;

#[async_trait]
impl StorageRepository for FailingStorage {
    async fn save(&self, _key: &str, _data: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::Other("disk full".to_string()))
    }
}

/// 写入时 panic 的存储
pub struct PanickingStorage;

#[async_trait]
impl StorageRepository for PanickingStorage {
    async fn save(&self, key: &str, _data: &[u8]) -> Result<(), StorageError> {
        panic!("storage exploded while writing {key}");
    }
}

/// 保存时记录当时已从消息流取出的消息数
pub struct FetchObservingStorage {
    fetched: Arc<AtomicUsize>,
    observed: Mutex<Vec<usize>>,
}

impl FetchObservingStorage {
    pub fn new(fetched: Arc<AtomicUsize>) -> Self {
        Self {
            fetched,
            observed: Mutex::new(Vec::new()),
        }
    }

    pub fn observed(&self) -> Vec<usize> {
        self.observed.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageRepository for FetchObservingStorage {
    async fn save(&self, _key: &str, _data: &[u8]) -> Result<(), StorageError> {
        let fetched = self.fetched.load(Ordering::SeqCst);
        self.observed.lock().unwrap().push(fetched);
        Ok(())
    }
}
