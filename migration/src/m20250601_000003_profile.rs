use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250601_000001_roles_and_users::Users;
use crate::m20250601_000002_catalog::{Companies, Schools, Skills};

#[derive(DeriveMigrationName)]
pub struct Migration;

fn owner_fk(
    name: &str,
    table: impl IntoIden + 'static,
    column: impl IntoIden + 'static,
) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(table, column)
        .to(Users::Table, Users::Id)
        .on_delete(ForeignKeyAction::Cascade)
        .on_update(ForeignKeyAction::Cascade)
        .to_owned()
}

fn parent_fk(
    name: &str,
    table: impl IntoIden + 'static,
    column: impl IntoIden + 'static,
    parent: impl IntoIden + 'static,
    parent_id: impl IntoIden + 'static,
) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(table, column)
        .to(parent, parent_id)
        .on_delete(ForeignKeyAction::Cascade)
        .on_update(ForeignKeyAction::Cascade)
        .to_owned()
}

fn unique_pair(
    name: &str,
    table: impl IntoIden + 'static,
    first: impl IntoIden + 'static,
    second: impl IntoIden + 'static,
) -> IndexCreateStatement {
    Index::create()
        .name(name)
        .table(table)
        .col(first)
        .col(second)
        .unique()
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // educations
        manager
            .create_table(
                Table::create()
                    .table(Educations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Educations::Id).string().not_null().primary_key())
                    .col(string(Educations::SchoolId))
                    .col(string(Educations::UserId))
                    .col(string(Educations::Title))
                    .col(date_null(Educations::StartedAt))
                    .col(date_null(Educations::FinishedAt))
                    .col(ColumnDef::new(Educations::IsActive).boolean().not_null().default(true))
                    .col(big_integer(Educations::CreatedAt))
                    .col(big_integer(Educations::UpdatedAt))
                    .foreign_key(&mut parent_fk(
                        "fk_educations_school",
                        Educations::Table,
                        Educations::SchoolId,
                        Schools::Table,
                        Schools::Id,
                    ))
                    .foreign_key(&mut owner_fk(
                        "fk_educations_user",
                        Educations::Table,
                        Educations::UserId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EducationTranslations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EducationTranslations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(EducationTranslations::EducationId))
                    .col(string(EducationTranslations::LanguageId))
                    .col(string(EducationTranslations::Title))
                    .col(string_null(EducationTranslations::Degree))
                    .col(string_null(EducationTranslations::FieldOfStudy))
                    .col(text_null(EducationTranslations::Description))
                    .col(big_integer(EducationTranslations::CreatedAt))
                    .col(big_integer(EducationTranslations::UpdatedAt))
                    .foreign_key(&mut parent_fk(
                        "fk_education_translations_education",
                        EducationTranslations::Table,
                        EducationTranslations::EducationId,
                        Educations::Table,
                        Educations::Id,
                    ))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(unique_pair(
                "idx_education_translations_language",
                EducationTranslations::Table,
                EducationTranslations::EducationId,
                EducationTranslations::LanguageId,
            ))
            .await?;

        // experiences
        manager
            .create_table(
                Table::create()
                    .table(Experiences::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Experiences::Id).string().not_null().primary_key())
                    .col(string(Experiences::CompanyId))
                    .col(string(Experiences::UserId))
                    .col(string(Experiences::Title))
                    .col(date_null(Experiences::StartedAt))
                    .col(date_null(Experiences::FinishedAt))
                    .col(ColumnDef::new(Experiences::IsActive).boolean().not_null().default(true))
                    .col(big_integer(Experiences::CreatedAt))
                    .col(big_integer(Experiences::UpdatedAt))
                    .foreign_key(&mut parent_fk(
                        "fk_experiences_company",
                        Experiences::Table,
                        Experiences::CompanyId,
                        Companies::Table,
                        Companies::Id,
                    ))
                    .foreign_key(&mut owner_fk(
                        "fk_experiences_user",
                        Experiences::Table,
                        Experiences::UserId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExperienceTranslations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExperienceTranslations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(ExperienceTranslations::ExperienceId))
                    .col(string(ExperienceTranslations::LanguageId))
                    .col(string(ExperienceTranslations::Title))
                    .col(text_null(ExperienceTranslations::Description))
                    .col(string_null(ExperienceTranslations::EmployeeType))
                    .col(string_null(ExperienceTranslations::Location))
                    .col(string_null(ExperienceTranslations::LocationType))
                    .col(big_integer(ExperienceTranslations::CreatedAt))
                    .col(big_integer(ExperienceTranslations::UpdatedAt))
                    .foreign_key(&mut parent_fk(
                        "fk_experience_translations_experience",
                        ExperienceTranslations::Table,
                        ExperienceTranslations::ExperienceId,
                        Experiences::Table,
                        Experiences::Id,
                    ))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(unique_pair(
                "idx_experience_translations_language",
                ExperienceTranslations::Table,
                ExperienceTranslations::ExperienceId,
                ExperienceTranslations::LanguageId,
            ))
            .await?;

        // projects
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Projects::Id).string().not_null().primary_key())
                    .col(string(Projects::UserId))
                    .col(string(Projects::Title))
                    .col(string(Projects::Slug))
                    .col(string_null(Projects::ImageUrl))
                    .col(string_null(Projects::LogoUrl))
                    .col(ColumnDef::new(Projects::IsActive).boolean().not_null().default(true))
                    .col(big_integer(Projects::CreatedAt))
                    .col(big_integer(Projects::UpdatedAt))
                    .foreign_key(&mut owner_fk(
                        "fk_projects_user",
                        Projects::Table,
                        Projects::UserId,
                    ))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(unique_pair(
                "idx_projects_user_slug",
                Projects::Table,
                Projects::UserId,
                Projects::Slug,
            ))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectTranslations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectTranslations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(ProjectTranslations::ProjectId))
                    .col(string(ProjectTranslations::LanguageId))
                    .col(string(ProjectTranslations::Title))
                    .col(text_null(ProjectTranslations::Description))
                    .col(big_integer(ProjectTranslations::CreatedAt))
                    .col(big_integer(ProjectTranslations::UpdatedAt))
                    .foreign_key(&mut parent_fk(
                        "fk_project_translations_project",
                        ProjectTranslations::Table,
                        ProjectTranslations::ProjectId,
                        Projects::Table,
                        Projects::Id,
                    ))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(unique_pair(
                "idx_project_translations_language",
                ProjectTranslations::Table,
                ProjectTranslations::ProjectId,
                ProjectTranslations::LanguageId,
            ))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectSkills::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ProjectSkills::Id).string().not_null().primary_key())
                    .col(string(ProjectSkills::ProjectId))
                    .col(string(ProjectSkills::SkillId))
                    .col(big_integer(ProjectSkills::CreatedAt))
                    .foreign_key(&mut parent_fk(
                        "fk_project_skills_project",
                        ProjectSkills::Table,
                        ProjectSkills::ProjectId,
                        Projects::Table,
                        Projects::Id,
                    ))
                    .foreign_key(&mut parent_fk(
                        "fk_project_skills_skill",
                        ProjectSkills::Table,
                        ProjectSkills::SkillId,
                        Skills::Table,
                        Skills::Id,
                    ))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(unique_pair(
                "idx_project_skills_pair",
                ProjectSkills::Table,
                ProjectSkills::ProjectId,
                ProjectSkills::SkillId,
            ))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectAttachments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectAttachments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(ProjectAttachments::ProjectId))
                    .col(string(ProjectAttachments::Title))
                    .col(string_null(ProjectAttachments::ImageUrl))
                    .col(text_null(ProjectAttachments::Description))
                    .col(string_null(ProjectAttachments::Category))
                    .col(string_null(ProjectAttachments::WebsiteUrl))
                    .col(
                        ColumnDef::new(ProjectAttachments::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(big_integer(ProjectAttachments::CreatedAt))
                    .col(big_integer(ProjectAttachments::UpdatedAt))
                    .foreign_key(&mut parent_fk(
                        "fk_project_attachments_project",
                        ProjectAttachments::Table,
                        ProjectAttachments::ProjectId,
                        Projects::Table,
                        Projects::Id,
                    ))
                    .to_owned(),
            )
            .await?;

        // solutions
        manager
            .create_table(
                Table::create()
                    .table(Solutions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Solutions::Id).string().not_null().primary_key())
                    .col(string(Solutions::UserId))
                    .col(string(Solutions::Title))
                    .col(string_null(Solutions::ImageUrl))
                    .col(string_null(Solutions::LogoUrl))
                    .col(ColumnDef::new(Solutions::IsActive).boolean().not_null().default(true))
                    .col(big_integer(Solutions::CreatedAt))
                    .col(big_integer(Solutions::UpdatedAt))
                    .foreign_key(&mut owner_fk(
                        "fk_solutions_user",
                        Solutions::Table,
                        Solutions::UserId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SolutionTranslations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SolutionTranslations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(string(SolutionTranslations::SolutionId))
                    .col(string(SolutionTranslations::LanguageId))
                    .col(string(SolutionTranslations::Title))
                    .col(text_null(SolutionTranslations::Description))
                    .col(big_integer(SolutionTranslations::CreatedAt))
                    .col(big_integer(SolutionTranslations::UpdatedAt))
                    .foreign_key(&mut parent_fk(
                        "fk_solution_translations_solution",
                        SolutionTranslations::Table,
                        SolutionTranslations::SolutionId,
                        Solutions::Table,
                        Solutions::Id,
                    ))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(unique_pair(
                "idx_solution_translations_language",
                SolutionTranslations::Table,
                SolutionTranslations::SolutionId,
                SolutionTranslations::LanguageId,
            ))
            .await?;

        // skill mappings
        manager
            .create_table(
                Table::create()
                    .table(SkillMappings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SkillMappings::Id).string().not_null().primary_key())
                    .col(string(SkillMappings::SkillId))
                    .col(string(SkillMappings::UserId))
                    .col(ColumnDef::new(SkillMappings::IsActive).boolean().not_null().default(true))
                    .col(big_integer(SkillMappings::CreatedAt))
                    .col(big_integer(SkillMappings::UpdatedAt))
                    .foreign_key(&mut parent_fk(
                        "fk_skill_mappings_skill",
                        SkillMappings::Table,
                        SkillMappings::SkillId,
                        Skills::Table,
                        Skills::Id,
                    ))
                    .foreign_key(&mut owner_fk(
                        "fk_skill_mappings_user",
                        SkillMappings::Table,
                        SkillMappings::UserId,
                    ))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(unique_pair(
                "idx_skill_mappings_user_skill",
                SkillMappings::Table,
                SkillMappings::UserId,
                SkillMappings::SkillId,
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            SkillMappings::Table.into_iden(),
            SolutionTranslations::Table.into_iden(),
            Solutions::Table.into_iden(),
            ProjectAttachments::Table.into_iden(),
            ProjectSkills::Table.into_iden(),
            ProjectTranslations::Table.into_iden(),
            Projects::Table.into_iden(),
            ExperienceTranslations::Table.into_iden(),
            Experiences::Table.into_iden(),
            EducationTranslations::Table.into_iden(),
            Educations::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Educations {
    Table,
    Id,
    SchoolId,
    UserId,
    Title,
    StartedAt,
    FinishedAt,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EducationTranslations {
    Table,
    Id,
    EducationId,
    LanguageId,
    Title,
    Degree,
    FieldOfStudy,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Experiences {
    Table,
    Id,
    CompanyId,
    UserId,
    Title,
    StartedAt,
    FinishedAt,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ExperienceTranslations {
    Table,
    Id,
    ExperienceId,
    LanguageId,
    Title,
    Description,
    EmployeeType,
    Location,
    LocationType,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    UserId,
    Title,
    Slug,
    ImageUrl,
    LogoUrl,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProjectTranslations {
    Table,
    Id,
    ProjectId,
    LanguageId,
    Title,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProjectSkills {
    Table,
    Id,
    ProjectId,
    SkillId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ProjectAttachments {
    Table,
    Id,
    ProjectId,
    Title,
    ImageUrl,
    Description,
    Category,
    WebsiteUrl,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Solutions {
    Table,
    Id,
    UserId,
    Title,
    ImageUrl,
    LogoUrl,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SolutionTranslations {
    Table,
    Id,
    SolutionId,
    LanguageId,
    Title,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SkillMappings {
    Table,
    Id,
    SkillId,
    UserId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
