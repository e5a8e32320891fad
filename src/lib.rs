// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 按任务执行的渲染流程
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 任务模型与存储接口
pub mod domain;

/// 引擎模块
///
/// 浏览器引擎接口、Chromium 实现与抓取会话
pub mod engines;

/// 基础设施模块
///
/// 本地存储与结果写入
pub mod infrastructure;

/// 队列模块
///
/// 消息投递接口与 NATS JetStream 客户端
pub mod queue;

/// 工具模块
///
/// 错误类型、重连策略与日志初始化
pub mod utils;

/// 工作器模块
///
/// 消息调度与 worker 生命周期管理
pub mod workers;
