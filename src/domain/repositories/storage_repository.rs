// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 目标路径已被非目录文件占用
    #[error("Path exists but is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    /// 键已存在，拒绝覆盖
    #[error("Artifact already exists: {0}")]
    AlreadyExists(String),
    /// 存储错误
    #[error("Storage error: {0}")]
    Other(String),
}

/// 存储仓库特质
///
/// 存储只追加：同名写入是错误而不是覆盖
#[async_trait]
pub trait StorageRepository: Send + Sync {
    /// 使用指定键保存数据到存储中
    ///
    /// 失败时不留下该键的任何部分数据
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;
}
