use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PriceRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PriceRecords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PriceRecords::TargetKey)
                            .string_len(255)
                            .not_null(),
                    )
                    // 正式值
                    .col(
                        ColumnDef::new(PriceRecords::Model)
                            .string_len(200)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(PriceRecords::ModelType)
                            .string_len(50)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(PriceRecords::BillingType)
                            .string_len(20)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(PriceRecords::ChannelType)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PriceRecords::Currency)
                            .string_len(10)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(PriceRecords::InputPrice)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(PriceRecords::OutputPrice)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(PriceRecords::PriceSource)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(PriceRecords::InputAudioTokens).double())
                    .col(ColumnDef::new(PriceRecords::OutputAudioTokens).double())
                    .col(ColumnDef::new(PriceRecords::CachedTokens).double())
                    .col(ColumnDef::new(PriceRecords::CachedReadTokens).double())
                    .col(ColumnDef::new(PriceRecords::CachedWriteTokens).double())
                    .col(ColumnDef::new(PriceRecords::ReasoningTokens).double())
                    .col(ColumnDef::new(PriceRecords::InputTextTokens).double())
                    .col(ColumnDef::new(PriceRecords::OutputTextTokens).double())
                    .col(ColumnDef::new(PriceRecords::InputImageTokens).double())
                    .col(ColumnDef::new(PriceRecords::OutputImageTokens).double())
                    .col(
                        ColumnDef::new(PriceRecords::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(PriceRecords::CreatedBy)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PriceRecords::UpdatedBy).string_len(100))
                    // 待审核覆盖值
                    .col(ColumnDef::new(PriceRecords::TempModel).string_len(200))
                    .col(ColumnDef::new(PriceRecords::TempModelType).string_len(50))
                    .col(ColumnDef::new(PriceRecords::TempBillingType).string_len(20))
                    .col(ColumnDef::new(PriceRecords::TempChannelType).integer())
                    .col(ColumnDef::new(PriceRecords::TempCurrency).string_len(10))
                    .col(ColumnDef::new(PriceRecords::TempInputPrice).double())
                    .col(ColumnDef::new(PriceRecords::TempOutputPrice).double())
                    .col(ColumnDef::new(PriceRecords::TempPriceSource).string_len(255))
                    .col(ColumnDef::new(PriceRecords::TempInputAudioTokens).double())
                    .col(ColumnDef::new(PriceRecords::TempOutputAudioTokens).double())
                    .col(ColumnDef::new(PriceRecords::TempCachedTokens).double())
                    .col(ColumnDef::new(PriceRecords::TempCachedReadTokens).double())
                    .col(ColumnDef::new(PriceRecords::TempCachedWriteTokens).double())
                    .col(ColumnDef::new(PriceRecords::TempReasoningTokens).double())
                    .col(ColumnDef::new(PriceRecords::TempInputTextTokens).double())
                    .col(ColumnDef::new(PriceRecords::TempOutputTextTokens).double())
                    .col(ColumnDef::new(PriceRecords::TempInputImageTokens).double())
                    .col(ColumnDef::new(PriceRecords::TempOutputImageTokens).double())
                    .col(ColumnDef::new(PriceRecords::ProposedBy).string_len(100))
                    .col(
                        ColumnDef::new(PriceRecords::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PriceRecords::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一渠道同一模型只允许存在一条记录（包括待审核的新提交），
        // 并发写入时由该索引拒绝第二条插入
        manager
            .create_index(
                Index::create()
                    .name("idx_price_records_target_key")
                    .table(PriceRecords::Table)
                    .col(PriceRecords::TargetKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 列表查询与审核队列索引
        manager
            .create_index(
                Index::create()
                    .name("idx_price_records_status")
                    .table(PriceRecords::Table)
                    .col(PriceRecords::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_price_records_channel_model")
                    .table(PriceRecords::Table)
                    .col(PriceRecords::ChannelType)
                    .col(PriceRecords::Model)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_price_records_created_at")
                    .table(PriceRecords::Table)
                    .col(PriceRecords::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PriceRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PriceRecords {
    Table,
    Id,
    TargetKey,
    Model,
    ModelType,
    BillingType,
    ChannelType,
    Currency,
    InputPrice,
    OutputPrice,
    PriceSource,
    InputAudioTokens,
    OutputAudioTokens,
    CachedTokens,
    CachedReadTokens,
    CachedWriteTokens,
    ReasoningTokens,
    InputTextTokens,
    OutputTextTokens,
    InputImageTokens,
    OutputImageTokens,
    Status,
    CreatedBy,
    UpdatedBy,
    TempModel,
    TempModelType,
    TempBillingType,
    TempChannelType,
    TempCurrency,
    TempInputPrice,
    TempOutputPrice,
    TempPriceSource,
    TempInputAudioTokens,
    TempOutputAudioTokens,
    TempCachedTokens,
    TempCachedReadTokens,
    TempCachedWriteTokens,
    TempReasoningTokens,
    TempInputTextTokens,
    TempOutputTextTokens,
    TempInputImageTokens,
    TempOutputImageTokens,
    ProposedBy,
    CreatedAt,
    UpdatedAt,
}
