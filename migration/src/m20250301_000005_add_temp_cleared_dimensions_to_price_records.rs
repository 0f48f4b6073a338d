use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 待审核提交中要删除的扩展维度，逗号分隔的列名
        manager
            .alter_table(
                Table::alter()
                    .table(PriceRecords::Table)
                    .add_column(ColumnDef::new(PriceRecords::TempClearedDimensions).string_len(512))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(PriceRecords::Table)
                    .drop_column(PriceRecords::TempClearedDimensions)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum PriceRecords {
    Table,
    TempClearedDimensions,
}
