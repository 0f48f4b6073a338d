use sea_orm_migration::prelude::*;
use std::env;

#[tokio::main]
async fn main() {
    // 如果没有设置 DATABASE_URL 环境变量，则默认设置为 data/price_hub.db
    if env::var("DATABASE_URL").is_err() {
        let in_migration_dir = env::current_dir()
            .map(|dir| dir.ends_with("migration"))
            .unwrap_or(false);
        let db_path = if in_migration_dir {
            "../data/price_hub.db"
        } else {
            "data/price_hub.db"
        };
        unsafe {
            env::set_var("DATABASE_URL", format!("sqlite://{db_path}"));
        }
    }
    cli::run_cli(migration::Migrator).await;
}
