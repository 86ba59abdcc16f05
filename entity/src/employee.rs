use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub name: String,
    pub position: String,
    pub job_title: Option<String>,
    #[sea_orm(column_type = "Double")]
    pub salary: f64,
    #[sea_orm(indexed)]
    pub department_id: Option<i32>,
    pub is_active: bool,
    pub hire_date: Date,
    pub last_activity_date: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id",
        on_delete = "Restrict"
    )]
    Department,
    #[sea_orm(has_many = "super::employee_project::Entity")]
    EmployeeProject,
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::employee_project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmployeeProject.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        super::employee_project::Relation::Project.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::employee_project::Relation::Employee.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
