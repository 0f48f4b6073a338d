//! # 后台任务
//!
//! 周期任务：价格采集、缓存预热、待审核巡检。停止通过 `CancellationToken`。

use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::app::context::AppContext;
use crate::app::task_scheduler::{ScheduledTask, TaskScheduler};
use crate::audit::AuditOutcome;
use crate::error::{HubError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{lerror, linfo};

/// 后台任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// 定时价格采集
    Ingestion,
    /// 热点缓存预热
    CacheWarm,
    /// 待审核巡检
    PendingAudit,
}

impl TaskType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ingestion => "ingestion",
            Self::CacheWarm => "cache_warm",
            Self::PendingAudit => "pending_audit",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type Job = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// 固定间隔的周期任务：首次延迟后执行一次，之后每个间隔执行一次
#[derive(Clone)]
pub struct PeriodicTask {
    task_type: TaskType,
    initial_delay: Duration,
    interval: Duration,
    job: Job,
    token: CancellationToken,
    handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl PeriodicTask {
    pub fn new<F, Fut>(task_type: TaskType, initial_delay: Duration, interval: Duration, job: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            task_type,
            initial_delay,
            interval,
            job: Arc::new(move || Box::pin(job())),
            token: CancellationToken::new(),
            handle: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let mut guard = self.handle.lock().await;
        if guard.is_some() {
            return Err(HubError::internal(format!(
                "后台任务 {} 已在运行",
                self.task_type
            )));
        }
        *guard = Some(tokio::spawn(run_periodic(
            self.task_type,
            self.initial_delay,
            self.interval,
            Arc::clone(&self.job),
            self.token.clone(),
        )));
        Ok(())
    }

    /// 取消并等待当前一次执行结束
    pub async fn stop(&self) -> Result<()> {
        self.token.cancel();
        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            handle
                .await
                .map_err(|e| HubError::internal_with_source("后台任务异常退出", e))?;
        }
        Ok(())
    }

    /// 包装为调度器任务
    pub fn scheduled(self) -> Result<ScheduledTask> {
        let start = self.clone();
        let stop = self.clone();
        ScheduledTask::builder(self.task_type)
            .on_start(move || {
                let task = start.clone();
                async move { task.start().await }
            })
            .on_stop(move || {
                let task = stop.clone();
                async move { task.stop().await }
            })
            .build()
    }
}

async fn run_periodic(
    task_type: TaskType,
    initial_delay: Duration,
    interval: Duration,
    job: Job,
    token: CancellationToken,
) {
    let mut delay = initial_delay;
    loop {
        tokio::select! {
            () = token.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
        if let Err(e) = job().await {
            lerror!(
                "system",
                LogStage::BackgroundTask,
                LogComponent::Scheduler,
                "task_run_failed",
                format!("后台任务执行失败: {e}"),
                task = %task_type
            );
        }
        delay = interval;
    }
    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Scheduler,
        "task_stopped",
        "后台任务已退出",
        task = %task_type
    );
}

/// 后台任务集合
pub struct AppTasks {
    scheduler: Arc<TaskScheduler>,
}

impl AppTasks {
    /// 按配置注册后台任务
    pub async fn initialize(context: &AppContext) -> Result<Arc<Self>> {
        let scheduler = Arc::new(TaskScheduler::new());
        let config = &context.config;
        let mut tasks = Vec::new();

        if config.ingestion.enabled {
            let ingestion = Arc::clone(&context.ingestion);
            tasks.push(
                PeriodicTask::new(
                    TaskType::Ingestion,
                    config.ingestion.initial_delay(),
                    config.ingestion.interval(),
                    move || {
                        let ingestion = Arc::clone(&ingestion);
                        async move { ingestion.run_ingestion_cycle().await.map(|_| ()) }
                    },
                )
                .scheduled()?,
            );
        }

        if config.cache.warm_interval > 0 {
            let warmer = Arc::clone(&context.warmer);
            let interval = Duration::from_secs(config.cache.warm_interval);
            tasks.push(
                PeriodicTask::new(TaskType::CacheWarm, Duration::ZERO, interval, move || {
                    let warmer = Arc::clone(&warmer);
                    async move {
                        warmer.warm().await;
                        Ok(())
                    }
                })
                .scheduled()?,
            );
        }

        if config.audit.enabled {
            let audit = Arc::clone(&context.audit);
            let interval = Duration::from_secs(config.audit.check_interval_secs);
            tasks.push(
                PeriodicTask::new(TaskType::PendingAudit, interval, interval, move || {
                    let audit = Arc::clone(&audit);
                    async move {
                        if let AuditOutcome::Notified(summary) = audit.check_pending().await? {
                            linfo!(
                                "audit",
                                LogStage::Audit,
                                LogComponent::Audit,
                                "pending_notified",
                                "已发送待审核通知",
                                total = summary.total
                            );
                        }
                        Ok(())
                    }
                })
                .scheduled()?,
            );
        }

        scheduler.register_many(tasks).await;
        Ok(Arc::new(Self { scheduler }))
    }

    #[must_use]
    pub fn scheduler(&self) -> Arc<TaskScheduler> {
        Arc::clone(&self.scheduler)
    }
}
