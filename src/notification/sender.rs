//! 通知发送器模块
//!
//! 定义告警投递的trait和基础实现

use crate::config::AlertConfig;
use crate::error::Result;
use crate::notification::dispatcher::AlertPayload;
use crate::notification::slack::SlackSender;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 通知发送器trait
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 发送告警
    ///
    /// # 参数
    /// * `payload` - 告警内容
    ///
    /// # 返回
    /// * `Result<()>` - 发送结果
    async fn send_alert(&self, payload: &AlertPayload) -> Result<()>;

    /// 测试连接
    ///
    /// # 参数
    /// * `message` - 测试消息内容
    async fn test_connection(&self, message: &str) -> Result<()>;
}

/// 空的通知发送器实现（未配置webhook时使用）
pub struct NoOpSender;

#[async_trait]
impl NotificationSender for NoOpSender {
    async fn send_alert(&self, payload: &AlertPayload) -> Result<()> {
        debug!(
            "未配置告警webhook，跳过 {} 个失败目标的告警",
            payload.failed_targets.len()
        );
        Ok(())
    }

    async fn test_connection(&self, _message: &str) -> Result<()> {
        Ok(())
    }
}

/// 根据告警配置创建发送器
///
/// 未配置webhook时返回 [`NoOpSender`]。
pub fn create_sender(config: &AlertConfig) -> Result<Arc<dyn NotificationSender>> {
    match &config.slack_webhook_url {
        Some(url) if !url.trim().is_empty() => Ok(Arc::new(SlackSender::from_config(config)?)),
        _ => {
            warn!("未配置 Slack webhook，告警将不会发送");
            Ok(Arc::new(NoOpSender))
        }
    }
}

/// 投递告警
///
/// 投递失败只记录警告，不影响本次运行的结果。
///
/// # 返回
/// * `bool` - 是否投递成功
pub async fn deliver(sender: &dyn NotificationSender, payload: &AlertPayload) -> bool {
    match sender.send_alert(payload).await {
        Ok(()) => {
            info!(
                run_id = %payload.run_id,
                failed = payload.failed_count,
                "告警已投递"
            );
            true
        }
        Err(e) => {
            warn!(
                run_id = %payload.run_id,
                error = %e,
                "DeliveryWarning: 告警投递失败"
            );
            false
        }
    }
}
