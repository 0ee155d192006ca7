//! 应用程序核心逻辑
//!
//! 串联一次完整运行：注册表 → 并发探测 → 汇总 → 报告 → 告警，以及命令分发

use crate::cli::args::{Args, Commands};
use crate::cli::commands::{
    CheckCommand, Command, CommandStatus, InitCommand, TestNotificationCommand, ValidateCommand,
    VersionCommand,
};
use crate::config::{Config, GlobalConfig, TargetRegistry};
use crate::error::{ConfigError, Result};
use crate::health::{ProbeExecutor, RunEngine, RunSummary, Transports};
use crate::logging::{emit_record, LogConfig, LoggingSystem};
use crate::notification::{deliver, AlertDispatcher, AlertPayload, NotificationSender};
use crate::report::Reporter;
use tracing::info;

/// 一次运行的产出
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// 运行汇总
    pub summary: RunSummary,
    /// 告警内容（没有失败时为 None）
    pub alert: Option<AlertPayload>,
    /// 告警是否投递成功（未投递时为 None）
    pub delivered: Option<bool>,
}

impl CheckOutcome {
    /// 命令状态
    pub fn status(&self) -> CommandStatus {
        if self.summary.all_passed() {
            CommandStatus::Success
        } else {
            CommandStatus::ChecksFailed
        }
    }
}

/// 执行一次完整运行
///
/// 配置错误（包括告警模板错误和找不到指定目标）在任何探测开始前返回。
/// 探测失败和告警投递失败都不会返回错误。
///
/// # 参数
/// * `config` - 已加载的配置
/// * `transports` - 探测使用的网络传输
/// * `sender` - 告警发送器，None 表示不投递
/// * `target` - 只检测指定名称的目标
pub async fn run_checks(
    config: &Config,
    transports: Transports,
    sender: Option<&dyn NotificationSender>,
    target: Option<&str>,
) -> Result<CheckOutcome> {
    let mut registry = TargetRegistry::load(config)?;
    if let Some(name) = target {
        registry = registry.select(name).ok_or_else(|| {
            ConfigError::ValidationError(format!("未找到名为 '{name}' 的启用目标"))
        })?;
    }

    let dispatcher = AlertDispatcher::new(config.alerts.message_template.as_deref())?;
    let engine = RunEngine::from_global_config(ProbeExecutor::new(transports), &config.global);

    let summary = engine.run(&registry).await;

    for result in &summary.results {
        emit_record(&Reporter::format_result(result));
    }
    emit_record(&Reporter::format_summary(&summary));

    let alert = dispatcher.evaluate(&summary);
    let delivered = match (&alert, sender) {
        (Some(payload), Some(sender)) => Some(deliver(sender, payload).await),
        _ => None,
    };

    Ok(CheckOutcome {
        summary,
        alert,
        delivered,
    })
}

/// 初始化日志系统
///
/// 命令行参数优先于配置文件。
pub fn init_logging(args: &Args, global: Option<&GlobalConfig>) -> Result<()> {
    let mut config = global.map(LogConfig::from_global).unwrap_or_default();

    if let Some(level) = args.log_level {
        config.level = level.into();
    } else if args.verbose {
        config.level = log::LevelFilter::Debug;
    }
    if let Some(path) = &args.log_file {
        config.file_path = Some(path.clone());
    }
    if args.json_logs {
        config.json_format = true;
    }

    LoggingSystem::setup_logging(config)?;
    Ok(())
}

/// 执行CLI命令
pub async fn execute_command(args: &Args) -> Result<CommandStatus> {
    let status = match &args.command {
        Commands::Check { .. } => CheckCommand.execute(args).await?,
        Commands::Validate => ValidateCommand.execute(args).await?,
        Commands::Init { .. } => InitCommand.execute(args).await?,
        Commands::Version { .. } => VersionCommand.execute(args).await?,
        Commands::TestNotification { .. } => TestNotificationCommand.execute(args).await?,
    };

    info!("命令执行完成: {:?}", status);
    Ok(status)
}
