//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::app::{init_logging, run_checks};
use crate::cli::args::{Args, Commands, ConfigTemplate, OutputFormat};
use crate::config::{Config, ConfigLoader, TargetRegistry, TomlConfigLoader};
use crate::error::{NotificationError, Result};
use crate::health::Transports;
use crate::notification::create_sender;
use crate::report::{render_table, render_text};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

/// 命令执行结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// 成功（全部检测通过）
    Success,
    /// 至少一个检测失败
    ChecksFailed,
}

impl CommandStatus {
    /// 进程退出码
    pub fn exit_code(&self) -> u8 {
        match self {
            CommandStatus::Success => 0,
            CommandStatus::ChecksFailed => 1,
        }
    }
}

/// 配置错误或其他致命错误的退出码
pub const FATAL_EXIT_CODE: u8 = 2;

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<CommandStatus>;
}

/// 加载配置并按配置初始化日志
async fn load_config(args: &Args) -> Result<Config> {
    let loader = TomlConfigLoader::default();
    let config_path = args.get_config_path();
    let config = match loader.load_from_file(&config_path).await {
        Ok(config) => config,
        Err(e) => {
            init_logging(args, None)?;
            return Err(e);
        }
    };
    init_logging(args, Some(&config.global))?;
    info!("成功加载配置文件: {}", config_path.display());
    debug!("配置内容: {:?}", config);
    Ok(config)
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<CommandStatus> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                _ => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(CommandStatus::Success)
    }
}

/// 初始化命令
pub struct InitCommand;

#[async_trait]
impl Command for InitCommand {
    async fn execute(&self, args: &Args) -> Result<CommandStatus> {
        if let Commands::Init {
            config_path,
            force,
            template,
        } = &args.command
        {
            init_logging(args, None)?;
            self.create_config_file(config_path, *force, *template).await?;
        }
        Ok(CommandStatus::Success)
    }
}

impl InitCommand {
    /// 创建配置文件
    async fn create_config_file(
        &self,
        config_path: &Path,
        force: bool,
        template: ConfigTemplate,
    ) -> Result<()> {
        // 检查文件是否已存在
        if config_path.exists() && !force {
            eprintln!("配置文件已存在: {}", config_path.display());
            eprintln!("使用 --force 参数覆盖现有文件");
            return Ok(());
        }

        // 创建目录（如果不存在）
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(config_path, Self::template_content(template)).await?;

        println!("配置文件已创建: {}", config_path.display());
        println!("请编辑配置文件以添加您的检测目标");

        Ok(())
    }

    /// 配置模板内容
    pub fn template_content(template: ConfigTemplate) -> &'static str {
        match template {
            ConfigTemplate::Minimal => include_str!("../../demos/minimal_config.toml"),
            ConfigTemplate::Full => include_str!("../../demos/full_config.toml"),
        }
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<CommandStatus> {
        let config_path = args.get_config_path();
        println!("验证配置文件: {}", config_path.display());

        let config = load_config(args).await?;
        let registry = TargetRegistry::load(&config)?;
        crate::notification::AlertDispatcher::new(config.alerts.message_template.as_deref())?;

        if args.is_verbose() {
            println!("配置验证通过！");
            println!("全局配置:");
            println!("  日志级别: {}", config.global.log_level);
            println!("  最大并发: {}", config.global.max_concurrent_checks);
            println!("  重试次数: {}", config.global.retry_attempts);
            println!(
                "  Slack告警: {}",
                if config.alerts.slack_webhook_url.is_some() { "已配置" } else { "未配置" }
            );

            println!("检测目标:");
            for (i, target) in registry.iter().enumerate() {
                println!("  {}. {} [{}] {}", i + 1, target.name, target.kind, target.endpoint());
                println!("     超时: {}ms", target.timeout.as_millis());
            }
        } else {
            println!("✓ 配置文件验证通过");
            println!("✓ 找到 {} 个启用的检测目标", registry.len());
        }

        Ok(CommandStatus::Success)
    }
}

/// 检测命令
pub struct CheckCommand;

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args) -> Result<CommandStatus> {
        let Commands::Check {
            target,
            format,
            no_alert,
        } = &args.command
        else {
            return Ok(CommandStatus::Success);
        };

        let config = load_config(args).await?;
        let sender = if *no_alert {
            None
        } else {
            Some(create_sender(&config.alerts)?)
        };

        let outcome = run_checks(
            &config,
            Transports::system()?,
            sender.as_deref(),
            target.as_deref(),
        )
        .await?;

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "summary": outcome.summary,
                    "alert": outcome.alert,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => println!("{}", render_table(&outcome.summary)),
            OutputFormat::Text => println!("{}", render_text(&outcome.summary)),
        }

        Ok(outcome.status())
    }
}

/// 测试通知命令
pub struct TestNotificationCommand;

#[async_trait]
impl Command for TestNotificationCommand {
    async fn execute(&self, args: &Args) -> Result<CommandStatus> {
        let Commands::TestNotification { message } = &args.command else {
            return Ok(CommandStatus::Success);
        };

        let config = load_config(args).await?;
        if config.alerts.slack_webhook_url.is_none() {
            println!("❌ 未配置 Slack webhook URL");
            println!("请在配置文件中设置 alerts.slack_webhook_url");
            return Err(NotificationError::ConfigError("未配置 Slack webhook URL".to_string()).into());
        }

        let sender = create_sender(&config.alerts)?;
        println!("📤 发送测试消息...");
        let text = format!(
            "{}\n{} v{} @ {}",
            message,
            crate::APP_NAME,
            crate::VERSION,
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );

        match sender.test_connection(&text).await {
            Ok(()) => {
                println!("✅ 测试消息发送成功");
                Ok(CommandStatus::Success)
            }
            Err(e) => {
                println!("❌ 测试消息发送失败: {e}");
                Err(e)
            }
        }
    }
}
