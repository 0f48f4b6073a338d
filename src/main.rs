//! # Price Hub 主程序
//!
//! - `serve`：执行迁移并运行后台任务（定时采集、缓存预热、待审核巡检）
//! - `ingest`：执行一轮采集后退出
//! - `rates [--official]`：输出倍率 JSON
//! - `approve` / `reject`：审批待审核记录

use clap::{Parser, Subcommand};
use std::sync::Arc;

use price_hub::{
    HubError, Result,
    app::{AppContext, AppTasks},
    approval::RejectOutcome,
    config::ConfigManager,
    database,
    error::Context,
    lerror, linfo,
    logging::{self, LogComponent, LogStage},
    rates::RateScope,
};

#[derive(Parser)]
#[command(name = "price-hub")]
#[command(about = "AI 模型价格聚合与对账")]
struct Cli {
    /// 日志级别（默认 info，可被 RUST_LOG 覆盖）
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 执行迁移并运行后台任务，Ctrl-C 退出
    Serve,
    /// 执行一轮价格采集
    Ingest,
    /// 输出倍率
    Rates {
        /// 仅包含官方厂商渠道
        #[arg(long)]
        official: bool,
    },
    /// 通过待审核记录
    Approve {
        /// 记录 ID，与 --all 二选一
        id: Option<i32>,
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
    /// 拒绝待审核记录
    Reject {
        id: Option<i32>,
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
    /// 打印日志配置说明
    LoggingHelp,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if matches!(cli.command, Commands::LoggingHelp) {
        logging::print_logging_help();
        return Ok(());
    }
    logging::init_optimized_logging(cli.log_level.as_ref());

    let result = run(cli.command).await;
    if let Err(e) = &result {
        lerror!(
            "system",
            LogStage::Shutdown,
            LogComponent::Main,
            "command_failed",
            format!("执行失败: {e}"),
            code = e.code(),
            cause = %e.root()
        );
    }
    result
}

async fn init_context() -> Result<AppContext> {
    let config = ConfigManager::new()
        .await
        .context("加载配置失败")?
        .get_config()
        .await;
    let db = database::init_database(&config.database)
        .await
        .context("连接数据库失败")?;
    database::run_migrations(&db)
        .await
        .context("执行数据库迁移失败")?;
    AppContext::build(config, Arc::new(db)).context("初始化应用上下文失败")
}

async fn run(command: Commands) -> Result<()> {
    let context = init_context().await?;

    match command {
        Commands::Serve => serve(&context).await,
        Commands::Ingest => {
            let report = context.ingestion.run_ingestion_cycle().await?;
            print_json(&report)
        }
        Commands::Rates { official } => {
            let scope = if official {
                RateScope::Official
            } else {
                RateScope::All
            };
            print_json(&context.rates.derive_rates(scope).await?)
        }
        Commands::Approve { id, all } => match (id, all) {
            (Some(id), false) => print_json(&context.approval.approve_one(id).await?),
            (None, true) => print_json(&context.approval.approve_all().await?),
            _ => Err(missing_target()),
        },
        Commands::Reject { id, all } => match (id, all) {
            (Some(id), false) => print_reject(&context.approval.reject_one(id).await?),
            (None, true) => {
                for outcome in context.approval.reject_all().await? {
                    print_reject(&outcome)?;
                }
                Ok(())
            }
            _ => Err(missing_target()),
        },
        Commands::LoggingHelp => Ok(()),
    }
}

async fn serve(context: &AppContext) -> Result<()> {
    let tasks = AppTasks::initialize(context).await?;
    let scheduler = tasks.scheduler();
    scheduler.start_all().await?;
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "service_started",
        "服务已启动",
        tasks = ?scheduler.registered().await
    );

    tokio::signal::ctrl_c().await?;

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_stopping",
        "收到退出信号，正在停止后台任务"
    );
    scheduler.shutdown().await
}

fn missing_target() -> HubError {
    price_hub::validation_error!("id", "需要指定记录 ID 或 --all")
}

fn print_reject(outcome: &RejectOutcome) -> Result<()> {
    match outcome {
        RejectOutcome::Deleted => {
            println!("deleted");
            Ok(())
        }
        RejectOutcome::Reverted(record) => print_json(record),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
