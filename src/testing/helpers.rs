//! # 测试辅助函数
//!
//! 提供通用的测试工具和辅助函数

use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::sync::{Arc, Once};

use entity::price_records;

use crate::cache::{CacheCoordinator, CacheTtl, MokaCacheStore};

use super::fixtures::PriceRecordFixture;

static INIT: Once = Once::new();

/// 初始化测试日志
pub fn init_test_env() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug,sqlx::query=off")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 创建内存数据库连接并运行迁移
pub async fn create_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// 测试用缓存协调器（默认 TTL）
#[must_use]
pub fn create_test_cache() -> Arc<CacheCoordinator> {
    Arc::new(CacheCoordinator::new(
        Arc::new(MokaCacheStore::new(1_000)),
        CacheTtl::default(),
    ))
}

/// 插入一条价格记录
pub async fn insert_record(
    db: &DatabaseConnection,
    fixture: PriceRecordFixture,
) -> Result<price_records::Model, DbErr> {
    fixture.build().insert(db).await
}
