//! Uptime Vitals - 基于配置的健康检测工具
//!
//! 读取检测目标配置，一次性并发执行检测并报告结果：
//! - HTTP/HTTPS、ICMP ping、DNS解析和TCP端口检测
//! - 结构化日志记录（控制台和文件）
//! - 存在失败时通过 Slack webhook 告警
//! - 退出码反映检测结果，便于在 cron 或 CI 中使用

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod notification;
pub mod report;

// 重新导出主要类型
pub use app::{run_checks, CheckOutcome};
pub use config::{CheckKind, Config, GlobalConfig, Target, TargetRegistry};
pub use error::{ConfigError, NotificationError, VitalsError};
pub use health::{aggregate, CheckResult, ProbeExecutor, RunEngine, RunSummary, Transports};
pub use notification::{AlertDispatcher, AlertPayload, NotificationSender};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
