//! ICMP ping 探测执行器
//!
//! 通过系统 ping 工具发送回显请求，并从输出中提取丢包率和平均往返时间。

use crate::config::Target;
use crate::health::executor::{timeout_detail, Probe};
use crate::health::result::CheckResult;
use crate::health::transport::PingRunner;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// 从 ping 输出解析出的统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PingStats {
    /// 丢包率（百分比）
    pub packet_loss: Option<f64>,
    /// 平均往返时间（毫秒）
    pub avg_rtt_ms: Option<f64>,
}

impl PingStats {
    /// 解析 Linux、macOS 和 Windows 的 ping 输出
    pub fn parse(output: &str) -> Self {
        static LOSS: OnceLock<Regex> = OnceLock::new();
        static RTT_UNIX: OnceLock<Regex> = OnceLock::new();
        static RTT_WINDOWS: OnceLock<Regex> = OnceLock::new();

        let loss = LOSS.get_or_init(|| {
            Regex::new(r"(\d+(?:\.\d+)?)%\s*(?:packet\s+)?loss").expect("valid loss regex")
        });
        let rtt_unix = RTT_UNIX.get_or_init(|| {
            Regex::new(r"=\s*[\d.]+/([\d.]+)/[\d.]+").expect("valid rtt regex")
        });
        let rtt_windows = RTT_WINDOWS.get_or_init(|| {
            Regex::new(r"Average\s*=\s*(\d+)\s*ms").expect("valid windows rtt regex")
        });

        let packet_loss = loss
            .captures(output)
            .and_then(|c| c[1].parse::<f64>().ok());
        let avg_rtt_ms = rtt_unix
            .captures(output)
            .or_else(|| rtt_windows.captures(output))
            .and_then(|c| c[1].parse::<f64>().ok());

        Self {
            packet_loss,
            avg_rtt_ms,
        }
    }

    /// 是否收到了至少一个回复
    pub fn any_reply(&self) -> bool {
        self.packet_loss.map_or(true, |loss| loss < 100.0)
    }

    /// 人类可读的描述，无可用统计时返回 None
    pub fn describe(&self) -> Option<String> {
        match (self.packet_loss, self.avg_rtt_ms) {
            (Some(loss), Some(rtt)) => Some(format!("{loss}% packet loss, avg {rtt}ms")),
            (Some(loss), None) => Some(format!("{loss}% packet loss")),
            (None, Some(rtt)) => Some(format!("avg {rtt}ms")),
            (None, None) => None,
        }
    }
}

/// ping 探测执行器
pub struct PingProbe {
    runner: Arc<dyn PingRunner>,
}

impl PingProbe {
    pub fn new(runner: Arc<dyn PingRunner>) -> Self {
        Self { runner }
    }

    /// 整个 ping 进程的截止时间：每个回显一个超时，再留一秒余量
    fn deadline(timeout_duration: Duration, count: u32) -> Duration {
        timeout_duration.saturating_mul(count.max(1)) + Duration::from_secs(1)
    }

    fn last_line(text: &str) -> Option<&str> {
        text.lines().map(str::trim).filter(|l| !l.is_empty()).last()
    }
}

#[async_trait]
impl Probe for PingProbe {
    async fn probe(&self, target: &Target, timeout_duration: Duration) -> CheckResult {
        let deadline = Self::deadline(timeout_duration, target.count);
        let start_time = Instant::now();
        let outcome = timeout(
            deadline,
            self.runner.ping(&target.address, target.count, timeout_duration),
        )
        .await;
        let latency = start_time.elapsed();

        let output = match outcome {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return CheckResult::failure(target, latency, format!("ping utility not available: {e}"));
            }
            Ok(Err(e)) => return CheckResult::failure(target, latency, format!("ping error: {e}")),
            Err(_) => return CheckResult::failure(target, latency, timeout_detail(deadline)),
        };

        let stats = PingStats::parse(&output.stdout);
        if output.success && stats.any_reply() {
            let detail = stats
                .describe()
                .unwrap_or_else(|| "reply received".to_string());
            return CheckResult::success(target, latency, detail);
        }

        let reason = Self::last_line(&output.stderr)
            .or_else(|| Self::last_line(&output.stdout))
            .unwrap_or("no reply");
        let detail = match stats.describe() {
            Some(summary) if !reason.contains("loss") => format!("{summary}: {reason}"),
            Some(summary) => summary,
            None => reason.to_string(),
        };
        CheckResult::failure(target, latency, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckKind;
    use crate::health::transport::PingOutput;

    const LINUX_OK: &str = "PING 1.1.1.1 (1.1.1.1) 56(84) bytes of data.
64 bytes from 1.1.1.1: icmp_seq=1 ttl=57 time=10.1 ms

--- 1.1.1.1 ping statistics ---
3 packets transmitted, 3 received, 0% packet loss, time 2003ms
rtt min/avg/max/mdev = 9.812/10.204/10.611/0.326 ms";

    const LINUX_LOSS: &str = "PING 10.255.255.1 (10.255.255.1) 56(84) bytes of data.

--- 10.255.255.1 ping statistics ---
3 packets transmitted, 0 received, 100% packet loss, time 2050ms";

    const MACOS_OK: &str = "--- 1.1.1.1 ping statistics ---
3 packets transmitted, 3 packets received, 0.0% packet loss
round-trip min/avg/max/stddev = 11.402/12.310/13.020/0.669 ms";

    const WINDOWS_OK: &str = "Ping statistics for 1.1.1.1:
    Packets: Sent = 3, Received = 3, Lost = 0 (0% loss),
Approximate round trip times in milli-seconds:
    Minimum = 9ms, Maximum = 12ms, Average = 10ms";

    struct FakePing {
        delay: Duration,
        output: std::io::Result<PingOutput>,
    }

    #[async_trait]
    impl PingRunner for FakePing {
        async fn ping(&self, _host: &str, _count: u32, _timeout: Duration) -> std::io::Result<PingOutput> {
            tokio::time::sleep(self.delay).await;
            match &self.output {
                Ok(output) => Ok(output.clone()),
                Err(e) => Err(std::io::Error::new(e.kind(), e.to_string())),
            }
        }
    }

    fn target() -> Target {
        Target::new("cloudflare", CheckKind::Ping, "1.1.1.1")
            .with_timeout(Duration::from_millis(100))
            .with_count(1)
    }

    fn probe(delay: Duration, output: std::io::Result<PingOutput>) -> PingProbe {
        PingProbe::new(Arc::new(FakePing { delay, output }))
    }

    #[test]
    fn test_parse_linux() {
        let stats = PingStats::parse(LINUX_OK);
        assert_eq!(stats.packet_loss, Some(0.0));
        assert_eq!(stats.avg_rtt_ms, Some(10.204));
        assert_eq!(stats.describe().unwrap(), "0% packet loss, avg 10.204ms");
    }

    #[test]
    fn test_parse_macos_and_windows() {
        let mac = PingStats::parse(MACOS_OK);
        assert_eq!(mac.packet_loss, Some(0.0));
        assert_eq!(mac.avg_rtt_ms, Some(12.31));

        let win = PingStats::parse(WINDOWS_OK);
        assert_eq!(win.packet_loss, Some(0.0));
        assert_eq!(win.avg_rtt_ms, Some(10.0));
    }

    #[test]
    fn test_parse_total_loss() {
        let stats = PingStats::parse(LINUX_LOSS);
        assert_eq!(stats.packet_loss, Some(100.0));
        assert!(!stats.any_reply());
        assert!(stats.avg_rtt_ms.is_none());
    }

    #[tokio::test]
    async fn test_reply_received() {
        let p = probe(
            Duration::ZERO,
            Ok(PingOutput {
                success: true,
                stdout: LINUX_OK.to_string(),
                stderr: String::new(),
            }),
        );

        let target = target();
        let result = p.probe(&target, target.timeout).await;
        assert!(result.success);
        assert!(result.detail.contains("0% packet loss"));
    }

    #[tokio::test]
    async fn test_packet_loss_is_failure() {
        let p = probe(
            Duration::ZERO,
            Ok(PingOutput {
                success: false,
                stdout: LINUX_LOSS.to_string(),
                stderr: String::new(),
            }),
        );

        let target = target();
        let result = p.probe(&target, target.timeout).await;
        assert!(!result.success);
        assert!(result.detail.contains("100% packet loss"));
    }

    #[tokio::test]
    async fn test_unknown_host_uses_stderr() {
        let p = probe(
            Duration::ZERO,
            Ok(PingOutput {
                success: false,
                stdout: String::new(),
                stderr: "ping: nonexistent.invalid: Name or service not known\n".to_string(),
            }),
        );

        let target = target();
        let result = p.probe(&target, target.timeout).await;
        assert!(!result.success);
        assert!(result.detail.contains("Name or service not known"));
    }

    #[tokio::test]
    async fn test_missing_ping_utility() {
        let p = probe(
            Duration::ZERO,
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory")),
        );

        let target = target();
        let result = p.probe(&target, target.timeout).await;
        assert!(!result.success);
        assert!(result.detail.starts_with("ping utility not available"));
    }

    #[tokio::test]
    async fn test_hung_ping_hits_deadline() {
        let p = probe(Duration::from_secs(30), Ok(PingOutput::default()));

        let target = target();
        let result = p.probe(&target, target.timeout).await;
        assert!(!result.success);
        assert_eq!(result.detail, "timeout after 1100ms");
    }
}
