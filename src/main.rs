//! Uptime Vitals 主程序入口
//!
//! 执行一次检测并以退出码报告结果

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use uptime_vitals::app::execute_command;
use uptime_vitals::cli::{Args, FATAL_EXIT_CODE};
use uptime_vitals::logging::LoggingSystem;

#[tokio::main]
async fn main() -> ExitCode {
    // 解析命令行参数
    let args = Args::parse();

    match execute_command(&args).await {
        Ok(status) => {
            info!("{} v{} 退出码 {}", uptime_vitals::APP_NAME, uptime_vitals::VERSION, status.exit_code());
            ExitCode::from(status.exit_code())
        }
        Err(e) => {
            if LoggingSystem::is_initialized() {
                error!("命令执行失败: {}", e);
            }
            eprintln!("错误: {e}");
            ExitCode::from(FATAL_EXIT_CODE)
        }
    }
}
