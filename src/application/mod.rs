// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 把会话、结果写入器组合成按任务执行的业务流程
pub mod use_cases;
