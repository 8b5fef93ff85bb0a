use sea_orm_migration::sea_orm::DatabaseBackend;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Enable foreign keys for SQLite
        if manager.get_database_backend() == DatabaseBackend::Sqlite {
            manager
                .get_connection()
                .execute_unprepared("PRAGMA foreign_keys = ON")
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(pk_auto(Roles::Id))
                    .col(string_uniq(Roles::Code))
                    .col(ColumnDef::new(Roles::Level).integer().not_null().default(0))
                    .col(string(Roles::Name))
                    .col(string_null(Roles::Description))
                    .col(ColumnDef::new(Roles::IsActive).boolean().not_null().default(true))
                    .col(big_integer(Roles::CreatedAt))
                    .col(big_integer(Roles::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RoleAuthorities::Table)
                    .if_not_exists()
                    .col(pk_auto(RoleAuthorities::Id))
                    .col(integer(RoleAuthorities::RoleId))
                    .col(string(RoleAuthorities::Feature))
                    .col(string(RoleAuthorities::Action))
                    .col(string_null(RoleAuthorities::Description))
                    .col(big_integer(RoleAuthorities::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_authorities_role")
                            .from(RoleAuthorities::Table, RoleAuthorities::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_role_authorities_grant")
                    .table(RoleAuthorities::Table)
                    .col(RoleAuthorities::RoleId)
                    .col(RoleAuthorities::Feature)
                    .col(RoleAuthorities::Action)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(integer_null(Users::RoleId))
                    .col(string_uniq(Users::Username))
                    .col(string_uniq(Users::Email))
                    .col(string(Users::Name))
                    .col(string(Users::PasswordHash))
                    .col(string_null(Users::ImageUrl))
                    .col(string_null(Users::PhoneNumber))
                    .col(string_null(Users::Gender))
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(big_integer_null(Users::LastLoginAt))
                    .col(big_integer(Users::CreatedAt))
                    .col(big_integer(Users::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_role")
                            .from(Users::Table, Users::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RoleAuthorities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Roles {
    Table,
    Id,
    Code,
    Level,
    Name,
    Description,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RoleAuthorities {
    Table,
    Id,
    RoleId,
    Feature,
    Action,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    RoleId,
    Username,
    Email,
    Name,
    PasswordHash,
    ImageUrl,
    PhoneNumber,
    Gender,
    IsActive,
    LastLoginAt,
    CreatedAt,
    UpdatedAt,
}
