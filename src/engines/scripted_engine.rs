// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::engines::traits::{
    EngineBrowser, EngineDriver, EngineError, EnginePage, EngineRuntime, NavigateOptions,
};

/// 注入失败的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Start,
    Launch,
    NewPage,
    Navigate,
    Content,
    BrowserClose,
    RuntimeStop,
}

/// 调用日志，按调用顺序记录各步骤名称
type CallLog = Arc<Mutex<Vec<&'static str>>>;

/// 脚本化引擎
///
/// 不启动真实浏览器，返回固定 HTML，并可在指定步骤注入失败。
/// 用于离线测试会话生命周期与调度器
#[derive(Clone)]
pub struct ScriptedEngine {
    html: String,
    fail_at: Option<FailAt>,
    calls: CallLog,
}

impl ScriptedEngine {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            fail_at: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_at(mut self, step: FailAt) -> Self {
        self.fail_at = Some(step);
        self
    }

    /// 当前调用日志的快照
    pub fn recorded(&self) -> Vec<&'static str> {
        self.calls.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

#[derive(Clone)]
struct Script {
    html: String,
    fail_at: Option<FailAt>,
    calls: CallLog,
}

impl Script {
    fn step(&self, name: &'static str, at: FailAt) -> Result<(), EngineError> {
        if let Ok(mut log) = self.calls.lock() {
            log.push(name);
        }
        if self.fail_at != Some(at) {
            return Ok(());
        }

        Err(match at {
            FailAt::Start => EngineError::RuntimeStart("scripted start failure".to_string()),
            FailAt::Launch => EngineError::Launch("scripted launch failure".to_string()),
            FailAt::NewPage => EngineError::PageOpen("scripted page failure".to_string()),
            FailAt::Navigate => EngineError::Navigation("scripted navigation failure".to_string()),
            FailAt::Content => EngineError::Capture("scripted capture failure".to_string()),
            FailAt::BrowserClose | FailAt::RuntimeStop => {
                EngineError::Teardown(format!("scripted {} failure", name))
            }
        })
    }
}

#[async_trait]
impl EngineDriver for ScriptedEngine {
    async fn start(&self) -> Result<Box<dyn EngineRuntime>, EngineError> {
        let script = Script {
            html: self.html.clone(),
            fail_at: self.fail_at,
            calls: self.calls.clone(),
        };
        script.step("start", FailAt::Start)?;
        Ok(Box::new(ScriptedRuntime { script }))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct ScriptedRuntime {
    script: Script,
}

#[async_trait]
impl EngineRuntime for ScriptedRuntime {
    async fn launch(&mut self) -> Result<Box<dyn EngineBrowser>, EngineError> {
        self.script.step("launch", FailAt::Launch)?;
        Ok(Box::new(ScriptedBrowser {
            script: self.script.clone(),
        }))
    }

    async fn stop(self: Box<Self>) -> Result<(), EngineError> {
        self.script.step("stop", FailAt::RuntimeStop)
    }
}

struct ScriptedBrowser {
    script: Script,
}

#[async_trait]
impl EngineBrowser for ScriptedBrowser {
    async fn new_page(&mut self) -> Result<Box<dyn EnginePage>, EngineError> {
        self.script.step("new_page", FailAt::NewPage)?;
        Ok(Box::new(ScriptedPage {
            script: self.script.clone(),
        }))
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        self.script.step("close", FailAt::BrowserClose)
    }
}

struct ScriptedPage {
    script: Script,
}

#[async_trait]
impl EnginePage for ScriptedPage {
    async fn navigate(&mut self, _uri: &str, _options: &NavigateOptions) -> Result<(), EngineError> {
        self.script.step("navigate", FailAt::Navigate)
    }

    async fn content(&mut self) -> Result<String, EngineError> {
        self.script.step("content", FailAt::Content)?;
        Ok(self.script.html.clone())
    }
}
