// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 渲染结果文件的扩展名
pub const ARTIFACT_EXTENSION: &str = "html";

/// 爬取任务
///
/// 由一条入站消息解码得到，只在单次处理尝试内存在，处理结束后即丢弃。
/// 消息格式固定为 `{"uri": "<string>"}`，任何其他结构都视为解码失败。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrawlTask {
    /// 目标页面地址
    pub uri: String,
}

impl CrawlTask {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// 从消息负载解码任务
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// 编码为消息负载
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// 爬取结果
///
/// 渲染成功并写入存储后产生，仅用于日志记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlResult {
    /// 来源地址
    pub source_uri: String,
    /// 存储中的文件名（`<uuid>.html`）
    pub artifact_name: String,
}

impl fmt::Display for CrawlResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {}", self.source_uri, self.artifact_name)
    }
}
