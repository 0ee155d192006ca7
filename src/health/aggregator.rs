//! 结果汇总
//!
//! 把一次运行的全部 [`CheckResult`] 汇总为 [`RunSummary`]。

use crate::health::result::CheckResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// 一次运行的汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// 运行ID
    pub run_id: Uuid,
    /// 按注册顺序排列的结果
    pub results: Vec<CheckResult>,
    /// 失败数量
    pub failed_count: usize,
    /// 总数量
    pub total_count: usize,
    /// 开始时间
    pub started_at: DateTime<Utc>,
    /// 结束时间
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// 运行耗时
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// 成功数量
    pub fn passed_count(&self) -> usize {
        self.total_count - self.failed_count
    }

    /// 是否全部成功
    pub fn all_passed(&self) -> bool {
        self.failed_count == 0
    }

    /// 失败的结果
    pub fn failed_results(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// 平均耗时（毫秒），没有结果时返回 None
    pub fn average_latency_ms(&self) -> Option<f64> {
        if self.results.is_empty() {
            return None;
        }
        let total: u128 = self.results.iter().map(|r| r.latency.as_millis()).sum();
        Some(total as f64 / self.results.len() as f64)
    }
}

/// 汇总一次运行的结果
///
/// 纯函数：保持输入顺序，空输入也是合法的。
///
/// # 参数
/// * `results` - 探测结果
/// * `started_at` - 运行开始时间
/// * `finished_at` - 运行结束时间
pub fn aggregate(
    results: Vec<CheckResult>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
) -> RunSummary {
    let failed_count = results.iter().filter(|r| !r.success).count();
    let total_count = results.len();

    RunSummary {
        run_id: Uuid::new_v4(),
        results,
        failed_count,
        total_count,
        started_at,
        finished_at,
    }
}
