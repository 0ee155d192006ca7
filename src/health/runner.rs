//! 运行引擎
//!
//! 对注册表中的每个目标并发执行一次探测，并发数由信号量限制。

use crate::config::{GlobalConfig, Target, TargetRegistry};
use crate::health::aggregator::{aggregate, RunSummary};
use crate::health::executor::ProbeExecutor;
use crate::health::result::CheckResult;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

/// 运行引擎
pub struct RunEngine {
    /// 探测执行器
    executor: Arc<ProbeExecutor>,
    /// 并发控制信号量
    semaphore: Arc<Semaphore>,
}

impl RunEngine {
    /// 创建新的运行引擎
    ///
    /// # 参数
    /// * `executor` - 探测执行器
    /// * `max_concurrent` - 最大并发探测数
    pub fn new(executor: ProbeExecutor, max_concurrent: usize) -> Self {
        Self {
            executor: Arc::new(executor),
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// 按全局配置创建运行引擎
    pub fn from_global_config(executor: ProbeExecutor, global: &GlobalConfig) -> Self {
        Self::new(
            executor.with_global_config(global),
            global.max_concurrent_checks,
        )
    }

    /// 执行一次完整运行
    ///
    /// 每个目标恰好产生一个结果，结果顺序与注册表顺序一致。
    pub async fn run(&self, registry: &TargetRegistry) -> RunSummary {
        let started_at = Utc::now();
        info!("开始检测 {} 个目标", registry.len());

        let handles: Vec<_> = registry
            .iter()
            .map(|target| {
                let executor = Arc::clone(&self.executor);
                let semaphore = Arc::clone(&self.semaphore);
                let target = target.clone();

                tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return CheckResult::failure(
                                &target,
                                Duration::ZERO,
                                format!("probe not started: {e}"),
                            );
                        }
                    };

                    debug!("开始检测目标: {}", target.name);
                    executor.probe(&target).await
                })
            })
            .collect();

        let joined = futures::future::join_all(handles).await;

        let results: Vec<CheckResult> = registry
            .iter()
            .zip(joined)
            .map(|(target, outcome)| match outcome {
                Ok(result) => result,
                Err(e) => Self::join_failure(target, &e),
            })
            .collect();

        let summary = aggregate(results, started_at, Utc::now());
        info!(
            run_id = %summary.run_id,
            total = summary.total_count,
            failed = summary.failed_count,
            "检测完成，耗时 {}ms",
            summary.duration().as_millis()
        );
        summary
    }

    /// 任务异常结束时生成失败结果
    fn join_failure(target: &Target, error: &tokio::task::JoinError) -> CheckResult {
        error!("检测任务异常结束 {}: {}", target.name, error);
        let detail = if error.is_panic() {
            "probe task panicked".to_string()
        } else {
            format!("probe task failed: {error}")
        };
        CheckResult::failure(target, Duration::ZERO, detail)
    }
}
