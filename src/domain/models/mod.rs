// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 任务（task）：一条消息对应的单个渲染任务及其结果
pub mod task;

pub use task::{CrawlResult, CrawlTask, ARTIFACT_EXTENSION};
