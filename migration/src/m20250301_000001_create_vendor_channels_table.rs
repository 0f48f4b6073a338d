use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VendorChannels::Table)
                    .if_not_exists()
                    // 渠道ID由业务方指定，不使用自增
                    .col(
                        ColumnDef::new(VendorChannels::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VendorChannels::Name)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(VendorChannels::Icon).string_len(255))
                    .col(
                        ColumnDef::new(VendorChannels::CreatedBy)
                            .string_len(100)
                            .not_null()
                            .default("system"),
                    )
                    .col(
                        ColumnDef::new(VendorChannels::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(VendorChannels::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VendorChannels::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VendorChannels {
    Table,
    Id,
    Name,
    Icon,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
