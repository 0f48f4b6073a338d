//! # 数据库模块
//!
//! 数据库连接和迁移管理

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::config::DatabaseConfig;

/// 初始化数据库连接
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let database_url = config.url.as_str();
    info!("正在连接数据库: {}", url_preview(database_url));

    // 对于SQLite数据库，确保数据库文件的目录和文件存在
    if let Some(db_path) = config.sqlite_file_path() {
        let db_file_path = Path::new(db_path);

        if let Some(parent_dir) = db_file_path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                debug!("创建数据库目录: {}", parent_dir.display());
                std::fs::create_dir_all(parent_dir).map_err(|e| {
                    DbErr::Custom(format!(
                        "无法创建数据库目录 {}: {}",
                        parent_dir.display(),
                        e
                    ))
                })?;
                info!("数据库目录创建成功: {}", parent_dir.display());
            }
        }

        if !db_file_path.exists() {
            debug!("创建数据库文件: {}", db_file_path.display());
            std::fs::File::create(db_file_path).map_err(|e| {
                DbErr::Custom(format!(
                    "无法创建数据库文件 {}: {}",
                    db_file_path.display(),
                    e
                ))
            })?;
            info!("数据库文件创建成功: {}", db_file_path.display());
        }
    }

    let mut options = ConnectOptions::new(database_url.to_string());
    options
        .max_connections(if config.is_memory_database() {
            1
        } else {
            config.max_connections
        })
        .connect_timeout(config.connect_timeout_duration())
        .sqlx_logging(false);

    let db = Database::connect(options).await?;

    info!("数据库连接成功");
    Ok(db)
}

/// 日志里展示的连接串前缀，按字符截断
fn url_preview(url: &str) -> String {
    url.chars().take(50).collect()
}

/// 运行数据库迁移
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    info!("开始运行数据库迁移...");

    match ::migration::Migrator::up(db, None).await {
        Ok(()) => {
            info!("数据库迁移完成");
            Ok(())
        }
        Err(e) => {
            error!("数据库迁移失败: {}", e);
            Err(e)
        }
    }
}

/// 检查数据库状态
pub async fn check_database_status(db: &DatabaseConnection) -> Result<(), DbErr> {
    let status = ::migration::Migrator::get_pending_migrations(db).await?;

    if status.is_empty() {
        info!("所有迁移都已应用");
    } else {
        warn!("有 {} 个待应用的迁移", status.len());
    }

    Ok(())
}
