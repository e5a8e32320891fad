// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施模块
///
/// 提供领域层仓库接口的具体实现：
/// - 存储（storage）：本地文件系统与内存存储
/// - 结果写入（result_sink）：为渲染结果生成唯一文件名并写入存储
pub mod result_sink;
pub mod storage;
