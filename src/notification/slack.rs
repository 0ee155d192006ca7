//! Slack通知发送器模块
//!
//! 实现 Slack incoming webhook 告警投递

use crate::config::AlertConfig;
use crate::error::{NotificationError, Result};
use crate::notification::dispatcher::AlertPayload;
use crate::notification::sender::NotificationSender;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};

/// Slack通知发送器
pub struct SlackSender {
    /// HTTP客户端
    client: Client,
    /// webhook URL
    webhook_url: String,
}

impl SlackSender {
    /// 创建新的Slack发送器
    ///
    /// # 参数
    /// * `webhook_url` - webhook URL
    /// * `timeout` - 投递超时时间
    ///
    /// # 返回
    /// * `Result<Self>` - 发送器实例
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotificationError::ConfigError(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }

    /// 根据告警配置创建发送器
    pub fn from_config(config: &AlertConfig) -> Result<Self> {
        let webhook_url = config
            .slack_webhook_url
            .clone()
            .ok_or_else(|| NotificationError::ConfigError("未配置 Slack webhook URL".to_string()))?;
        Self::new(webhook_url, Duration::from_secs(config.timeout_seconds))
    }

    /// 构建Slack消息体
    fn build_message_body(text: &str) -> Value {
        json!({ "text": text })
    }

    /// 发送消息到Slack
    async fn send_to_webhook(&self, body: &Value) -> Result<()> {
        debug!("发送消息到Slack webhook");

        let response = self
            .client
            .post(&self.webhook_url)
            .json(body)
            .send()
            .await
            .map_err(|e| NotificationError::SendError(format!("发送Slack消息失败: {e}")))?;

        if response.status().is_success() {
            info!("Slack消息发送成功");
            Ok(())
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!("Slack消息发送失败: {} - {}", status, text);
            Err(NotificationError::SendError(format!("Slack返回 {status}")).into())
        }
    }
}

#[async_trait]
impl NotificationSender for SlackSender {
    async fn send_alert(&self, payload: &AlertPayload) -> Result<()> {
        let body = Self::build_message_body(&payload.summary_text);
        self.send_to_webhook(&body).await
    }

    async fn test_connection(&self, message: &str) -> Result<()> {
        let body = Self::build_message_body(message);
        self.send_to_webhook(&body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn payload() -> AlertPayload {
        AlertPayload {
            summary_text: "1/1 checks failed:\n- bad-host [dns] NXDOMAIN: nonexistent.invalid"
                .to_string(),
            failed_targets: BTreeSet::from(["bad-host".to_string()]),
            failed_count: 1,
            total_count: 1,
            run_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_send_alert_posts_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "text": "1/1 checks failed:\n- bad-host [dns] NXDOMAIN: nonexistent.invalid"
            })))
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let sender =
            SlackSender::new(format!("{}/hook", server.url()), Duration::from_secs(5)).unwrap();
        sender.send_alert(&payload()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_2xx_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/hook")
            .with_status(500)
            .with_body("invalid_payload")
            .create_async()
            .await;

        let sender =
            SlackSender::new(format!("{}/hook", server.url()), Duration::from_secs(5)).unwrap();
        let err = sender.send_alert(&payload()).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::VitalsError::Notification(NotificationError::SendError(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_body(Matcher::Json(json!({ "text": "hello" })))
            .with_status(200)
            .create_async()
            .await;

        let sender =
            SlackSender::new(format!("{}/hook", server.url()), Duration::from_secs(5)).unwrap();
        sender.test_connection("hello").await.unwrap();
        mock.assert_async().await;
    }

    #[test]
    fn test_from_config_requires_webhook() {
        assert!(SlackSender::from_config(&AlertConfig::default()).is_err());
    }
}
