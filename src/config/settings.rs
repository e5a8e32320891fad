// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// 一个任务内除导航以外的 CDP 请求数
///
/// 打开页面、启用生命周期事件、订阅导航事件、订阅生命周期事件、
/// 查询主框架、读取内容、关闭浏览器，每个都受 request_timeout 约束
const CDP_REQUESTS_PER_TASK: u32 = 7;

/// 应用程序配置设置
///
/// 启动时构造一次，通过引用传入各组件的构造函数
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 消息代理配置
    pub nats_server: NatsSettings,
    /// 浏览器引擎配置
    pub engine: EngineSettings,
    /// 存储配置
    pub storage: StorageSettings,
    /// 日志配置
    pub log: LogSettings,
}

/// 消息代理（NATS JetStream）配置
#[derive(Debug, Clone, Deserialize)]
pub struct NatsSettings {
    /// 代理主机地址
    pub endpoint: String,
    /// 代理端口
    pub port: u16,
    /// 订阅的主题
    pub subject: String,
    /// 队列组名称，同组的进程竞争消费
    pub queue_group: String,
    /// JetStream 流名称，未配置时按主题解析
    pub stream: Option<String>,
}

impl NatsSettings {
    /// 代理连接地址
    pub fn url(&self) -> String {
        format!("nats://{}:{}", self.endpoint, self.port)
    }
}

/// 浏览器引擎家族
///
/// 每个部署固定一种，不随任务变化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserFamily {
    /// Chromium / Chrome（CDP）
    Chromium,
}

/// 页面就绪条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WaitUntil {
    /// load 事件触发即可
    Load,
    /// 网络空闲（静默窗口内无网络活动）
    #[default]
    NetworkIdle,
}

/// 浏览器引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// 浏览器可执行文件路径，未配置时自动探测
    pub executable_path: Option<PathBuf>,
    /// 引擎家族
    pub family: BrowserFamily,
    /// 是否无头模式
    pub headless: bool,
    /// 是否启用沙箱
    pub sandbox: bool,
    /// 页面就绪条件
    pub wait_until: WaitUntil,
    /// 导航超时时间（秒）
    pub navigation_timeout_secs: u64,
    /// 等待网络空闲的超时时间（秒）
    pub network_idle_timeout_secs: u64,
    /// 浏览器进程启动超时时间（秒）
    pub launch_timeout_secs: u64,
    /// 单个 CDP 请求的超时时间（秒）
    pub request_timeout_secs: u64,
    /// 关闭浏览器后等待进程退出的时间（秒），超时则强制结束
    pub exit_timeout_secs: u64,
}

impl EngineSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn network_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.network_idle_timeout_secs)
    }

    pub fn launch_timeout(&self) -> Duration {
        Duration::from_secs(self.launch_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn exit_timeout(&self) -> Duration {
        Duration::from_secs(self.exit_timeout_secs)
    }

    /// 单个任务在引擎内可能消耗的最长时间
    ///
    /// 每一步都有各自的上限，预算是这些上限之和
    pub fn task_budget(&self) -> Duration {
        self.launch_timeout()
            + self.navigation_timeout()
            + self.network_idle_timeout()
            + self.request_timeout() * CDP_REQUESTS_PER_TASK
            + self.exit_timeout()
    }
}

/// 存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 渲染结果目录
    pub runtime_dir: PathBuf,
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub format: LogFormat,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、`config/default`、`config/{APP_ENVIRONMENT}`、
    /// `{CONFIG_PATH}/env` 以及 `RENDERQ__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let mut builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));

        // 显式给出的配置目录必须存在配置文件
        if let Ok(dir) = std::env::var("CONFIG_PATH") {
            let path = PathBuf::from(dir).join("env");
            builder = builder.add_source(File::with_name(&path.to_string_lossy()));
        }

        Self::from_builder(
            builder.add_source(
                Environment::with_prefix("RENDERQ")
                    .separator("__")
                    .try_parsing(true),
            ),
        )
    }

    /// 带默认值的配置构建器
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            // Default broker settings
            .set_default("nats_server.endpoint", "127.0.0.1")?
            .set_default("nats_server.port", 4222)?
            .set_default("nats_server.subject", "crawl.tasks")?
            .set_default("nats_server.queue_group", "worker")?
            // Default engine settings
            .set_default("engine.family", "chromium")?
            .set_default("engine.headless", true)?
            .set_default("engine.sandbox", false)?
            .set_default("engine.wait_until", "network_idle")?
            .set_default("engine.navigation_timeout_secs", 30)?
            .set_default("engine.network_idle_timeout_secs", 30)?
            .set_default("engine.launch_timeout_secs", 20)?
            .set_default("engine.request_timeout_secs", 30)?
            .set_default("engine.exit_timeout_secs", 10)?
            // Default storage settings
            .set_default("storage.runtime_dir", "runtime")?
            .set_default("log.format", "pretty")
    }

    /// 从构建器生成配置，测试中可直接注入内存源
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}
