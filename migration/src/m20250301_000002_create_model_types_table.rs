use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ModelTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ModelTypes::TypeKey)
                            .string_len(50)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ModelTypes::TypeLabel)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ModelTypes::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_model_types_sort_order")
                    .table(ModelTypes::Table)
                    .col(ModelTypes::SortOrder)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ModelTypes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ModelTypes {
    Table,
    TypeKey,
    TypeLabel,
    SortOrder,
}
