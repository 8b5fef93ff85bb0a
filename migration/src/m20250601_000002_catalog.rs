use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Companies::Id).string().not_null().primary_key())
                    .col(string_uniq(Companies::Code))
                    .col(string_uniq(Companies::Name))
                    .col(string_null(Companies::ImageUrl))
                    .col(string_null(Companies::LogoUrl))
                    .col(string_null(Companies::WebsiteUrl))
                    .col(ColumnDef::new(Companies::IsActive).boolean().not_null().default(true))
                    .col(big_integer(Companies::CreatedAt))
                    .col(big_integer(Companies::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CompanyTranslations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CompanyTranslations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(CompanyTranslations::CompanyId))
                    .col(string(CompanyTranslations::LanguageId))
                    .col(string(CompanyTranslations::Name))
                    .col(text_null(CompanyTranslations::Description))
                    .col(string_null(CompanyTranslations::Address))
                    .col(big_integer(CompanyTranslations::CreatedAt))
                    .col(big_integer(CompanyTranslations::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_translations_company")
                            .from(CompanyTranslations::Table, CompanyTranslations::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_company_translations_language")
                    .table(CompanyTranslations::Table)
                    .col(CompanyTranslations::CompanyId)
                    .col(CompanyTranslations::LanguageId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Schools::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Schools::Id).string().not_null().primary_key())
                    .col(string_uniq(Schools::Code))
                    .col(string_uniq(Schools::Name))
                    .col(string_null(Schools::ImageUrl))
                    .col(string_null(Schools::LogoUrl))
                    .col(string_null(Schools::WebsiteUrl))
                    .col(ColumnDef::new(Schools::IsActive).boolean().not_null().default(true))
                    .col(big_integer(Schools::CreatedAt))
                    .col(big_integer(Schools::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SchoolTranslations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SchoolTranslations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(SchoolTranslations::SchoolId))
                    .col(string(SchoolTranslations::LanguageId))
                    .col(string(SchoolTranslations::Name))
                    .col(text_null(SchoolTranslations::Description))
                    .col(string_null(SchoolTranslations::Address))
                    .col(big_integer(SchoolTranslations::CreatedAt))
                    .col(big_integer(SchoolTranslations::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_school_translations_school")
                            .from(SchoolTranslations::Table, SchoolTranslations::SchoolId)
                            .to(Schools::Table, Schools::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_school_translations_language")
                    .table(SchoolTranslations::Table)
                    .col(SchoolTranslations::SchoolId)
                    .col(SchoolTranslations::LanguageId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Skills::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Skills::Id).string().not_null().primary_key())
                    .col(string_uniq(Skills::Code))
                    .col(string_uniq(Skills::Name))
                    .col(string_null(Skills::Category))
                    .col(string_null(Skills::ImageUrl))
                    .col(string_null(Skills::LogoUrl))
                    .col(string_null(Skills::WebsiteUrl))
                    .col(ColumnDef::new(Skills::IsActive).boolean().not_null().default(true))
                    .col(big_integer(Skills::CreatedAt))
                    .col(big_integer(Skills::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SkillTranslations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SkillTranslations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(SkillTranslations::SkillId))
                    .col(string(SkillTranslations::LanguageId))
                    .col(string(SkillTranslations::Name))
                    .col(text_null(SkillTranslations::Description))
                    .col(big_integer(SkillTranslations::CreatedAt))
                    .col(big_integer(SkillTranslations::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_skill_translations_skill")
                            .from(SkillTranslations::Table, SkillTranslations::SkillId)
                            .to(Skills::Table, Skills::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_skill_translations_language")
                    .table(SkillTranslations::Table)
                    .col(SkillTranslations::SkillId)
                    .col(SkillTranslations::LanguageId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SkillTranslations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Skills::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SchoolTranslations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Schools::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CompanyTranslations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Companies::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Companies {
    Table,
    Id,
    Code,
    Name,
    ImageUrl,
    LogoUrl,
    WebsiteUrl,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CompanyTranslations {
    Table,
    Id,
    CompanyId,
    LanguageId,
    Name,
    Description,
    Address,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Schools {
    Table,
    Id,
    Code,
    Name,
    ImageUrl,
    LogoUrl,
    WebsiteUrl,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SchoolTranslations {
    Table,
    Id,
    SchoolId,
    LanguageId,
    Name,
    Description,
    Address,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Skills {
    Table,
    Id,
    Code,
    Name,
    Category,
    ImageUrl,
    LogoUrl,
    WebsiteUrl,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SkillTranslations {
    Table,
    Id,
    SkillId,
    LanguageId,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}
