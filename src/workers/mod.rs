// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 消息调度与 worker 生命周期管理
pub mod dispatcher;
pub mod manager;

pub use dispatcher::{Outcome, TaskDispatcher};
