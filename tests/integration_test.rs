//! # 集成测试
//!
//! 测试数据库初始化、迁移和实体定义的集成

use entity::{ModelTypes, PriceRecords, VendorChannels, price_records};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use tempfile::TempDir;

use price_hub::config::DatabaseConfig;
use price_hub::database::{check_database_status, init_database, run_migrations};

fn file_config(dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("nested/price_hub.db").display()),
        ..DatabaseConfig::default()
    }
}

#[tokio::test]
async fn test_database_migration_and_entities() {
    let dir = TempDir::new().unwrap();
    let config = file_config(&dir);

    // 目录与文件不存在时自动创建
    let db = init_database(&config).await.expect("数据库连接失败");
    assert!(dir.path().join("nested/price_hub.db").exists());

    run_migrations(&db).await.expect("数据库迁移失败");
    // 重复执行迁移不会报错
    run_migrations(&db).await.expect("重复迁移失败");
    check_database_status(&db).await.unwrap();

    let vendors = VendorChannels::find()
        .order_by_asc(entity::vendor_channels::Column::Id)
        .all(&db)
        .await
        .expect("查询 vendor_channels 失败");
    assert_eq!(vendors.len(), 7);
    assert_eq!(vendors[0].id, 1);

    let types = ModelTypes::find().all(&db).await.unwrap();
    assert_eq!(types.len(), 8);

    let now = chrono::Utc::now().naive_utc();
    let record = price_records::ActiveModel {
        target_key: Set("1:gpt-5".to_string()),
        model: Set("gpt-5".to_string()),
        model_type: Set("text2text".to_string()),
        billing_type: Set("tokens".to_string()),
        channel_type: Set(1),
        currency: Set("USD".to_string()),
        input_price: Set(1.25),
        output_price: Set(10.0),
        price_source: Set("官网".to_string()),
        status: Set("approved".to_string()),
        created_by: Set("tester".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let inserted = record.clone().insert(&db).await.expect("插入价格记录失败");
    assert_eq!(inserted.temp_model, None);

    // 目标键唯一
    assert!(record.insert(&db).await.is_err());
    assert_eq!(PriceRecords::find().all(&db).await.unwrap().len(), 1);
}
