use sea_orm_migration::prelude::*;

use crate::m20250101_000001_directory::Employee;

#[derive(DeriveIden)]
enum Project {
    #[sea_orm(iden = "projects")]
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum EmployeeProject {
    #[sea_orm(iden = "employee_projects")]
    Table,
    EmployeeId,
    ProjectId,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Project::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Project::Name).string_len(255).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmployeeProject::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EmployeeProject::EmployeeId).integer().not_null())
                    .col(ColumnDef::new(EmployeeProject::ProjectId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(EmployeeProject::EmployeeId)
                            .col(EmployeeProject::ProjectId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employee_projects_employee")
                            .from(EmployeeProject::Table, EmployeeProject::EmployeeId)
                            .to(Employee::Table, Employee::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employee_projects_project")
                            .from(EmployeeProject::Table, EmployeeProject::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_employee_projects_project")
                    .table(EmployeeProject::Table)
                    .col(EmployeeProject::ProjectId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(EmployeeProject::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Project::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
