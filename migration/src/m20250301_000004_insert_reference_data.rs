use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 默认厂商渠道：(渠道ID, 名称)
const DEFAULT_VENDORS: &[(i32, &str)] = &[
    (1, "OpenAI"),
    (14, "Anthropic"),
    (17, "通义千问"),
    (20, "OpenRouter"),
    (25, "Google Gemini"),
    (45, "SiliconFlow"),
    (1001, "xAI"),
];

/// 默认模型类型：(类型键, 显示名称, 排序)
const DEFAULT_MODEL_TYPES: &[(&str, &str, i32)] = &[
    ("text2text", "文生文", 1),
    ("multimodal", "多模态", 2),
    ("text2image", "文生图", 3),
    ("text2video", "文生视频", 4),
    ("image2video", "图生视频", 5),
    ("text2speech", "文生音", 6),
    ("embedding", "嵌入", 7),
    ("other", "其他", 99),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut vendors = Query::insert()
            .into_table(VendorChannels::Table)
            .columns([
                VendorChannels::Id,
                VendorChannels::Name,
                VendorChannels::CreatedBy,
            ])
            .to_owned();
        for (id, name) in DEFAULT_VENDORS {
            vendors.values_panic([(*id).into(), (*name).into(), "system".into()]);
        }
        manager.exec_stmt(vendors).await?;

        let mut model_types = Query::insert()
            .into_table(ModelTypes::Table)
            .columns([
                ModelTypes::TypeKey,
                ModelTypes::TypeLabel,
                ModelTypes::SortOrder,
            ])
            .to_owned();
        for (key, label, order) in DEFAULT_MODEL_TYPES {
            model_types.values_panic([(*key).into(), (*label).into(), (*order).into()]);
        }
        manager.exec_stmt(model_types).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(ModelTypes::Table)
                    .and_where(
                        Expr::col(ModelTypes::TypeKey)
                            .is_in(DEFAULT_MODEL_TYPES.iter().map(|(key, _, _)| *key)),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .exec_stmt(
                Query::delete()
                    .from_table(VendorChannels::Table)
                    .and_where(
                        Expr::col(VendorChannels::Id)
                            .is_in(DEFAULT_VENDORS.iter().map(|(id, _)| *id)),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

// 表定义枚举
#[derive(DeriveIden)]
enum VendorChannels {
    Table,
    Id,
    Name,
    CreatedBy,
}

#[derive(DeriveIden)]
enum ModelTypes {
    Table,
    TypeKey,
    TypeLabel,
    SortOrder,
}
