//! TCP端口探测执行器

use crate::config::Target;
use crate::health::executor::{timeout_detail, Probe};
use crate::health::result::CheckResult;
use crate::health::transport::TcpConnector;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// TCP端口探测执行器
///
/// 在超时前建立连接即为成功，连接建立后立即关闭。
pub struct TcpProbe {
    connector: Arc<dyn TcpConnector>,
}

impl TcpProbe {
    pub fn new(connector: Arc<dyn TcpConnector>) -> Self {
        Self { connector }
    }

    /// 连接错误描述
    fn describe_error(error: &std::io::Error) -> String {
        match error.kind() {
            ErrorKind::ConnectionRefused => "connection refused".to_string(),
            ErrorKind::TimedOut => format!("timeout: {error}"),
            ErrorKind::HostUnreachable | ErrorKind::NetworkUnreachable => {
                format!("unreachable: {error}")
            }
            _ => format!("connect error: {error}"),
        }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn probe(&self, target: &Target, timeout_duration: Duration) -> CheckResult {
        let Some(port) = target.port else {
            return CheckResult::failure(target, Duration::ZERO, "no port configured");
        };

        let start_time = Instant::now();
        let outcome = timeout(timeout_duration, self.connector.connect(&target.address, port)).await;
        let latency = start_time.elapsed();

        match outcome {
            Ok(Ok(())) => CheckResult::success(
                target,
                latency,
                format!("connected in {}ms", latency.as_millis()),
            ),
            Ok(Err(e)) => CheckResult::failure(target, latency, Self::describe_error(&e)),
            Err(_) => CheckResult::failure(target, latency, timeout_detail(timeout_duration)),
        }
    }
}
