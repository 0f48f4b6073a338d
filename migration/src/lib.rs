pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_vendor_channels_table;
mod m20250301_000002_create_model_types_table;
mod m20250301_000003_create_price_records_table;
mod m20250301_000004_insert_reference_data;
mod m20250301_000005_add_temp_cleared_dimensions_to_price_records;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_vendor_channels_table::Migration),
            Box::new(m20250301_000002_create_model_types_table::Migration),
            Box::new(m20250301_000003_create_price_records_table::Migration),
            Box::new(m20250301_000004_insert_reference_data::Migration),
            Box::new(m20250301_000005_add_temp_cleared_dimensions_to_price_records::Migration),
        ]
    }
}
