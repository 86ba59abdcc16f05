use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
pub(crate) enum Department {
    #[sea_orm(iden = "departments")]
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
pub(crate) enum Employee {
    #[sea_orm(iden = "employees")]
    Table,
    Id,
    Name,
    Position,
    JobTitle,
    Salary,
    DepartmentId,
    IsActive,
    HireDate,
    LastActivityDate,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Department::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Department::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Department::Name).string_len(255).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Employee::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employee::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Employee::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Employee::Position).string_len(255).not_null())
                    .col(ColumnDef::new(Employee::JobTitle).string_len(255))
                    .col(
                        ColumnDef::new(Employee::Salary)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Employee::DepartmentId).integer())
                    .col(
                        ColumnDef::new(Employee::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Employee::HireDate).date().not_null())
                    .col(ColumnDef::new(Employee::LastActivityDate).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_department")
                            .from(Employee::Table, Employee::DepartmentId)
                            .to(Department::Table, Department::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_employees_department")
                    .table(Employee::Table)
                    .col(Employee::DepartmentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_employees_active_name")
                    .table(Employee::Table)
                    .col(Employee::IsActive)
                    .col(Employee::Name)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Employee::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Department::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
