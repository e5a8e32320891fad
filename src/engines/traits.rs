// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::settings::{EngineSettings, WaitUntil};

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 自动化运行时无法启动
    #[error("Engine runtime failed to start: {0}")]
    RuntimeStart(String),
    /// 找不到浏览器可执行文件
    #[error("Engine binary not found: {}", .0.display())]
    BinaryMissing(PathBuf),
    /// 浏览器启动失败
    #[error("Browser launch failed: {0}")]
    Launch(String),
    /// 无法打开页面
    #[error("Page open failed: {0}")]
    PageOpen(String),
    /// 目标地址不合法
    #[error("Invalid uri {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },
    /// 导航失败
    #[error("Navigation failed: {0}")]
    Navigation(String),
    /// 导航或就绪等待超时
    #[error("Navigation to {uri} timed out after {timeout:?}")]
    NavigationTimeout { uri: String, timeout: Duration },
    /// 序列化页面内容失败
    #[error("Content capture failed: {0}")]
    Capture(String),
    /// 资源释放失败
    #[error("Teardown failed: {0}")]
    Teardown(String),
    /// 会话只能使用一次
    #[error("Crawl session already used")]
    SessionReused,
}

/// 导航参数
#[derive(Debug, Clone)]
pub struct NavigateOptions {
    /// 页面就绪条件
    pub wait_until: WaitUntil,
    /// 导航超时
    pub navigation_timeout: Duration,
    /// 等待网络空闲的超时
    pub network_idle_timeout: Duration,
}

impl From<&EngineSettings> for NavigateOptions {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            wait_until: settings.wait_until,
            navigation_timeout: settings.navigation_timeout(),
            network_idle_timeout: settings.network_idle_timeout(),
        }
    }
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self {
            wait_until: WaitUntil::NetworkIdle,
            navigation_timeout: Duration::from_secs(30),
            network_idle_timeout: Duration::from_secs(30),
        }
    }
}

/// 浏览器引擎驱动
///
/// 每个任务调用一次 `start`，得到独占的运行时
#[async_trait]
pub trait EngineDriver: Send + Sync {
    /// 启动浏览器自动化运行时
    async fn start(&self) -> Result<Box<dyn EngineRuntime>, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}

/// 浏览器自动化运行时
#[async_trait]
pub trait EngineRuntime: Send {
    /// 启动一个浏览器实例
    async fn launch(&mut self) -> Result<Box<dyn EngineBrowser>, EngineError>;

    /// 停止运行时，必须在浏览器关闭之后调用
    async fn stop(self: Box<Self>) -> Result<(), EngineError>;
}

/// 浏览器实例
#[async_trait]
pub trait EngineBrowser: Send {
    /// 打开一个页面
    async fn new_page(&mut self) -> Result<Box<dyn EnginePage>, EngineError>;

    /// 关闭浏览器及其所有页面
    async fn close(self: Box<Self>) -> Result<(), EngineError>;
}

/// 页面
#[async_trait]
pub trait EnginePage: Send {
    /// 导航到目标地址并阻塞直到满足就绪条件
    async fn navigate(&mut self, uri: &str, options: &NavigateOptions) -> Result<(), EngineError>;

    /// 序列化渲染后的 DOM
    async fn content(&mut self) -> Result<String, EngineError>;
}
