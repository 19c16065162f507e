// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含数据库、Redis、服务器、工作者池、调度器和数据保留等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 数据库配置
    pub database: DatabaseSettings,
    /// Redis配置
    pub redis: RedisSettings,
    /// 工作者池配置
    pub workers: WorkerSettings,
    /// 调度器配置
    pub scheduler: SchedulerSettings,
    /// 数据保留配置
    pub retention: RetentionSettings,
    /// 抓取来源配置
    pub sources: SourceSettings,
}

/// 服务器配置设置
#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
    /// Prometheus指标暴露端口
    pub metrics_port: u16,
}

/// 数据库配置设置
#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// Redis配置设置
#[derive(Debug, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL
    pub url: String,
}

/// 工作者池配置设置
#[derive(Debug, Deserialize)]
pub struct WorkerSettings {
    /// 工作者数量
    pub count: usize,
    /// 按领取顺序排列的队列名称
    pub queues: Vec<String>,
    /// 队列为空时的轮询间隔（秒）
    pub poll_interval_secs: u64,
    /// 单个任务的执行时间上限（秒）
    pub job_timeout_secs: u64,
    /// 抓取单个页面的HTTP超时（秒）
    pub fetch_timeout_secs: u64,
}

/// 调度器配置设置
///
/// cron表达式为六段格式（秒 分 时 日 月 星期）。
#[derive(Debug, Deserialize)]
pub struct SchedulerSettings {
    /// 是否启用定时调度
    pub enabled: bool,
    /// 定时抓取的cron表达式
    pub fetch_cron: String,
    /// 定时清理的cron表达式
    pub cleanup_cron: String,
    /// 定时重算分数的cron表达式
    pub recompute_cron: String,
    /// 重算分数的回溯窗口天数
    pub recompute_days_back: u32,
}

/// 数据保留配置设置
#[derive(Debug, Deserialize)]
pub struct RetentionSettings {
    /// 低质量文章的保留天数
    pub article_days: u32,
    /// 任务历史记录的保留天数
    pub history_days: u32,
}

/// 抓取来源配置设置
#[derive(Debug, Deserialize)]
pub struct SourceSettings {
    /// 定时抓取的来源URL列表
    pub urls: Vec<String>,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Start with default settings
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.metrics_port", 9100)?
            // Default DB pool settings
            .set_default("database.url", "sqlite://feedrs.db?mode=rwc")?
            .set_default("database.max_connections", 100)?
            .set_default("database.min_connections", 10)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default Redis settings
            .set_default("redis.url", "redis://127.0.0.1:6379/")?
            // Default Worker settings
            .set_default("workers.count", 4)?
            .set_default("workers.queues", vec!["default".to_string()])?
            .set_default("workers.poll_interval_secs", 1)?
            .set_default("workers.job_timeout_secs", 300)?
            .set_default("workers.fetch_timeout_secs", 30)?
            // Default Scheduler settings
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.fetch_cron", "0 0 * * * *")?
            .set_default("scheduler.cleanup_cron", "0 0 2 * * *")?
            .set_default("scheduler.recompute_cron", "0 */30 * * * *")?
            .set_default("scheduler.recompute_days_back", 7)?
            // Default Retention settings
            .set_default("retention.article_days", 90)?
            .set_default("retention.history_days", 90)?
            // Default Source settings
            .set_default("sources.urls", Vec::<String>::new())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("FEEDRS").separator("__"));

        builder.build()?.try_deserialize()
    }
}
