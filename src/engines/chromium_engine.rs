// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    EventFrameNavigated, EventLifecycleEvent, FrameId, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::settings::{EngineSettings, WaitUntil};
use crate::engines::traits::{
    EngineBrowser, EngineDriver, EngineError, EnginePage, EngineRuntime, NavigateOptions,
};

/// 网络空闲的生命周期事件名
const NETWORK_IDLE_EVENT: &str = "networkIdle";
/// 新文档开始加载的生命周期事件名
const DOCUMENT_INIT_EVENT: &str = "init";

/// Chromium 引擎
///
/// 基于 chromiumoxide（CDP）实现，每个任务独占一个浏览器进程，不做复用
pub struct ChromiumEngine {
    settings: EngineSettings,
}

impl ChromiumEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl EngineDriver for ChromiumEngine {
    /// 校验可执行文件并生成浏览器启动配置
    async fn start(&self) -> Result<Box<dyn EngineRuntime>, EngineError> {
        // 每个运行时使用独立的 profile 目录，避免同机多个 worker 争用锁文件
        let profile_dir = std::env::temp_dir().join(format!("renderq-{}", Uuid::new_v4()));

        let mut builder = BrowserConfig::builder()
            .launch_timeout(self.settings.launch_timeout())
            .request_timeout(self.settings.request_timeout())
            .user_data_dir(&profile_dir);

        if let Some(path) = &self.settings.executable_path {
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                return Err(EngineError::BinaryMissing(path.clone()));
            }
            builder = builder.chrome_executable(path);
        }
        if !self.settings.headless {
            builder = builder.with_head();
        }
        if !self.settings.sandbox {
            builder = builder.no_sandbox();
        }

        // Production environment setup
        builder = builder.arg("--disable-gpu").arg("--disable-dev-shm-usage");

        let config = builder.build().map_err(EngineError::RuntimeStart)?;

        Ok(Box::new(ChromiumRuntime {
            config: Some(config),
            profile_dir,
            exit_timeout: self.settings.exit_timeout(),
            handler: None,
        }))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// Chromium 运行时
///
/// 持有 CDP 事件循环任务和临时 profile 目录
struct ChromiumRuntime {
    config: Option<BrowserConfig>,
    profile_dir: PathBuf,
    exit_timeout: Duration,
    handler: Option<JoinHandle<()>>,
}

#[async_trait]
impl EngineRuntime for ChromiumRuntime {
    async fn launch(&mut self) -> Result<Box<dyn EngineBrowser>, EngineError> {
        let config = self
            .config
            .take()
            .ok_or_else(|| EngineError::Launch("browser already launched".to_string()))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| EngineError::Launch(e.to_string()))?;

        // Spawn a handler to process browser events
        self.handler = Some(tokio::spawn(async move {
            drive_handler(&mut handler).await;
        }));

        Ok(Box::new(ChromiumBrowser {
            browser,
            exit_timeout: self.exit_timeout,
        }))
    }

    async fn stop(self: Box<Self>) -> Result<(), EngineError> {
        if let Some(handle) = self.handler {
            handle.abort();
            let _ = handle.await;
        }

        match tokio::fs::remove_dir_all(&self.profile_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::Teardown(format!(
                "failed to remove profile {}: {}",
                self.profile_dir.display(),
                e
            ))),
        }
    }
}

struct ChromiumBrowser {
    browser: Browser,
    exit_timeout: Duration,
}

#[async_trait]
impl EngineBrowser for ChromiumBrowser {
    async fn new_page(&mut self) -> Result<Box<dyn EnginePage>, EngineError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::PageOpen(e.to_string()))?;

        page.execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(|e| EngineError::PageOpen(e.to_string()))?;

        // 记录加载过程中每一次（重新）导航，仅用于诊断
        let mut navigations = page
            .event_listener::<EventFrameNavigated>()
            .await
            .map_err(|e| EngineError::PageOpen(e.to_string()))?;
        let navigation_logger = tokio::spawn(async move {
            while let Some(event) = navigations.next().await {
                info!(url = %event.frame.url, "Page navigated");
            }
        });

        Ok(Box::new(ChromiumPage {
            page,
            navigation_logger,
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        let mut browser = self.browser;
        shut_down(&mut browser, self.exit_timeout).await
    }
}

/// 浏览器进程的关闭操作
#[async_trait]
trait BrowserProcess: Send {
    /// 通过 CDP 请求浏览器退出
    async fn request_close(&mut self) -> Result<(), String>;

    /// 强制结束进程
    async fn kill(&mut self);

    /// 等待进程退出
    async fn wait_exit(&mut self) -> std::io::Result<()>;
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn request_close(&mut self) -> Result<(), String> {
        self.close().await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn kill(&mut self) {
        if let Some(Err(e)) = Browser::kill(self).await {
            warn!(error = %e, "Failed to kill browser process");
        }
    }

    async fn wait_exit(&mut self) -> std::io::Result<()> {
        self.wait().await.map(|_| ())
    }
}

/// 关闭浏览器并等待进程退出
///
/// 关闭请求失败时直接结束进程；进程在 `exit_timeout` 内没有退出也会被结束。
/// 返回关闭请求本身的结果
async fn shut_down<P: BrowserProcess>(process: &mut P, exit_timeout: Duration) -> Result<(), EngineError> {
    let closed = process
        .request_close()
        .await
        .map_err(|e| EngineError::Teardown(format!("browser close: {}", e)));

    if let Err(e) = &closed {
        warn!(error = %e, "Browser refused to close, killing process");
        process.kill().await;
    }

    match tokio::time::timeout(exit_timeout, process.wait_exit()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Failed to wait for browser exit"),
        Err(_) => {
            warn!(timeout = ?exit_timeout, "Browser did not exit in time, killing process");
            process.kill().await;
        }
    }

    closed
}

/// 驱动 CDP 事件循环直到连接关闭
///
/// 单个事件的错误只记录，循环继续，否则之后的所有命令（包括关闭）都会失败
async fn drive_handler<S, E>(handler: &mut S)
where
    S: Stream<Item = Result<(), E>> + Unpin,
    E: Display,
{
    while let Some(event) = handler.next().await {
        if let Err(e) = event {
            debug!(error = %e, "CDP handler error");
        }
    }
}

struct ChromiumPage {
    page: Page,
    navigation_logger: JoinHandle<()>,
}

impl Drop for ChromiumPage {
    fn drop(&mut self) {
        self.navigation_logger.abort();
    }
}

#[async_trait]
impl EnginePage for ChromiumPage {
    async fn navigate(&mut self, uri: &str, options: &NavigateOptions) -> Result<(), EngineError> {
        // 在导航之前订阅，事件会在通道中缓冲，不会错过
        let lifecycle = self
            .page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(|e| EngineError::Navigation(e.to_string()))?;
        let main_frame = self
            .page
            .mainframe()
            .await
            .map_err(|e| EngineError::Navigation(e.to_string()))
            .and_then(require_main_frame)?;

        tokio::time::timeout(options.navigation_timeout, self.page.goto(uri))
            .await
            .map_err(|_| EngineError::NavigationTimeout {
                uri: uri.to_string(),
                timeout: options.navigation_timeout,
            })?
            .map_err(|e| EngineError::Navigation(e.to_string()))?;

        match options.wait_until {
            // goto 已等待 load 事件
            WaitUntil::Load => Ok(()),
            WaitUntil::NetworkIdle => {
                tokio::time::timeout(
                    options.network_idle_timeout,
                    wait_for_network_idle(lifecycle, &main_frame),
                )
                .await
                .map_err(|_| EngineError::NavigationTimeout {
                    uri: uri.to_string(),
                    timeout: options.network_idle_timeout,
                })?
            }
        }
    }

    async fn content(&mut self) -> Result<String, EngineError> {
        self.page
            .content()
            .await
            .map_err(|e| EngineError::Capture(e.to_string()))
    }
}

/// 没有主框架就无法区分子框架的生命周期事件
fn require_main_frame(frame: Option<FrameId>) -> Result<FrameId, EngineError> {
    frame.ok_or_else(|| EngineError::Navigation("page has no main frame".to_string()))
}

/// 等待主框架新文档的 networkIdle 事件
///
/// 只接受在 `init`（新文档开始）之后出现的 networkIdle，about:blank 的旧事件被忽略
async fn wait_for_network_idle<S>(events: S, main_frame: &FrameId) -> Result<(), EngineError>
where
    S: Stream<Item = Arc<EventLifecycleEvent>>,
{
    futures::pin_mut!(events);
    let mut document_started = false;

    while let Some(event) = events.next().await {
        if &event.frame_id != main_frame {
            continue;
        }

        match event.name.as_str() {
            DOCUMENT_INIT_EVENT => document_started = true,
            NETWORK_IDLE_EVENT if document_started => {
                debug!("Network idle reached");
                return Ok(());
            }
            _ => {}
        }
    }

    Err(EngineError::Navigation(
        "lifecycle event stream closed before network idle".to_string(),
    ))
}
