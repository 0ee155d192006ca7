//! HTTP探测执行器

use crate::config::Target;
use crate::health::executor::{timeout_detail, Probe};
use crate::health::result::CheckResult;
use crate::health::transport::{HttpTransport, HttpTransportError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// HTTP探测执行器
///
/// 在超时时间内收到响应且状态码在目标的可接受集合内即为成功。
pub struct HttpProbe {
    transport: Arc<dyn HttpTransport>,
}

impl HttpProbe {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// 状态码描述，例如 "HTTP 503 Service Unavailable"
    fn describe_status(status_code: u16) -> String {
        format!(
            "HTTP {} {}",
            status_code,
            reqwest::StatusCode::from_u16(status_code)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown")
        )
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, target: &Target, timeout_duration: Duration) -> CheckResult {
        let start_time = Instant::now();
        let outcome = timeout(timeout_duration, self.transport.execute(target, timeout_duration)).await;
        let latency = start_time.elapsed();

        match outcome {
            Ok(Ok(status_code)) if target.accepts_status(status_code) => {
                CheckResult::success(target, latency, status_code.to_string())
                    .with_status_code(status_code)
            }
            Ok(Ok(status_code)) => CheckResult::failure(
                target,
                latency,
                format!("bad status: {}", Self::describe_status(status_code)),
            )
            .with_status_code(status_code),
            Ok(Err(HttpTransportError::Timeout)) | Err(_) => {
                CheckResult::failure(target, latency, timeout_detail(timeout_duration))
            }
            Ok(Err(e)) => CheckResult::failure(target, latency, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckKind;

    /// 返回固定状态码（或错误）的假传输
    struct FakeTransport {
        delay: Duration,
        response: Result<u16, HttpTransportError>,
    }

    #[async_trait]
    impl HttpTransport for FakeTransport {
        async fn execute(&self, _target: &Target, _timeout: Duration) -> Result<u16, HttpTransportError> {
            tokio::time::sleep(self.delay).await;
            self.response.clone()
        }
    }

    fn probe_with(delay: Duration, response: Result<u16, HttpTransportError>) -> HttpProbe {
        HttpProbe::new(Arc::new(FakeTransport { delay, response }))
    }

    fn github_api() -> Target {
        Target::new("github-api", CheckKind::Http, "https://api.github.com")
            .with_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_status_200_within_timeout() {
        let probe = probe_with(Duration::from_millis(120), Ok(200));
        let target = github_api();

        let result = probe.probe(&target, target.timeout).await;

        assert!(result.success);
        assert_eq!(result.detail, "200");
        assert_eq!(result.status_code, Some(200));
        assert!(result.latency >= Duration::from_millis(120));
        assert!(result.latency < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_unexpected_status() {
        let probe = probe_with(Duration::ZERO, Ok(503));
        let target = github_api();

        let result = probe.probe(&target, target.timeout).await;

        assert!(!result.success);
        assert_eq!(result.status_code, Some(503));
        assert!(result.detail.contains("bad status"));
        assert!(result.detail.contains("HTTP 503 Service Unavailable"));
    }

    #[tokio::test]
    async fn test_per_target_status_override() {
        let probe = probe_with(Duration::ZERO, Ok(301));
        let target = github_api().with_expected_status_codes(vec![301, 302]);

        let result = probe.probe(&target, target.timeout).await;
        assert!(result.success);
        assert_eq!(result.detail, "301");
    }

    #[tokio::test]
    async fn test_slow_transport_times_out() {
        let probe = probe_with(Duration::from_secs(10), Ok(200));
        let target = github_api().with_timeout(Duration::from_millis(50));

        let result = probe.probe(&target, target.timeout).await;

        assert!(!result.success);
        assert_eq!(result.detail, "timeout after 50ms");
        assert!(result.latency < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_connection_error() {
        let probe = probe_with(
            Duration::ZERO,
            Err(HttpTransportError::Connect("Connection refused (os error 111)".to_string())),
        );
        let target = github_api();

        let result = probe.probe(&target, target.timeout).await;

        assert!(!result.success);
        assert!(result.detail.starts_with("connection error"));
        assert!(result.status_code.is_none());
    }

    #[tokio::test]
    async fn test_transport_timeout_is_reported_as_timeout() {
        let probe = probe_with(Duration::ZERO, Err(HttpTransportError::Timeout));
        let target = github_api();

        let result = probe.probe(&target, target.timeout).await;
        assert_eq!(result.detail, "timeout after 5000ms");
    }
}
