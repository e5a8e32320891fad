// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::engines::traits::{EngineBrowser, EngineDriver, EngineError, NavigateOptions};

/// 抓取会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    EngineRunning,
    BrowserLaunched,
    PageOpen,
    ContentCaptured,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::EngineRunning => "engine_running",
            SessionState::BrowserLaunched => "browser_launched",
            SessionState::PageOpen => "page_open",
            SessionState::ContentCaptured => "content_captured",
            SessionState::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}

/// 抓取会话
///
/// 一个会话对应一次渲染：启动运行时、启动浏览器、打开页面、导航、取内容，
/// 然后按相反顺序释放资源。无论在哪一步失败，已获取的资源都会被释放，
/// 且浏览器总是先于运行时关闭。会话只能使用一次。
pub struct CrawlSession {
    driver: Arc<dyn EngineDriver>,
    options: NavigateOptions,
    state: SessionState,
    transitions: Vec<SessionState>,
}

impl CrawlSession {
    pub fn new(driver: Arc<dyn EngineDriver>, options: NavigateOptions) -> Self {
        Self {
            driver,
            options,
            state: SessionState::Uninitialized,
            transitions: vec![SessionState::Uninitialized],
        }
    }

    /// 当前状态
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 经历过的全部状态，按顺序
    pub fn transitions(&self) -> &[SessionState] {
        &self.transitions
    }

    fn advance(&mut self, next: SessionState) {
        debug!(from = %self.state, to = %next, engine = self.driver.name(), "Session transition");
        self.state = next;
        self.transitions.push(next);
    }

    /// 渲染目标页面并返回序列化后的 HTML
    ///
    /// 资源释放失败只记录日志，不会覆盖渲染结果
    pub async fn capture(&mut self, uri: &str) -> Result<String, EngineError> {
        if self.state != SessionState::Uninitialized {
            return Err(EngineError::SessionReused);
        }

        // 非法地址在启动引擎之前拒绝
        validate_uri(uri)?;

        let outcome = self.run(uri).await;
        self.advance(SessionState::Closed);
        outcome
    }

    async fn run(&mut self, uri: &str) -> Result<String, EngineError> {
        let mut runtime = self.driver.start().await?;
        self.advance(SessionState::EngineRunning);

        let outcome = match runtime.launch().await {
            Ok(mut browser) => {
                self.advance(SessionState::BrowserLaunched);
                let rendered = self.render(browser.as_mut(), uri).await;
                if let Err(e) = browser.close().await {
                    warn!(error = %e, uri = %uri, "Failed to close browser");
                }
                rendered
            }
            Err(e) => Err(e),
        };

        if let Err(e) = runtime.stop().await {
            warn!(error = %e, uri = %uri, "Failed to stop engine runtime");
        }

        outcome
    }

    async fn render(&mut self, browser: &mut dyn EngineBrowser, uri: &str) -> Result<String, EngineError> {
        let mut page = browser.new_page().await?;
        self.advance(SessionState::PageOpen);

        page.navigate(uri, &self.options).await?;
        let html = page.content().await?;
        self.advance(SessionState::ContentCaptured);

        Ok(html)
    }
}

/// 只接受 http/https 绝对地址
fn validate_uri(uri: &str) -> Result<Url, EngineError> {
    let invalid = |reason: String| EngineError::InvalidUri {
        uri: uri.to_string(),
        reason,
    };

    let url = Url::parse(uri).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}
