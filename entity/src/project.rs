use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::employee_project::Entity")]
    EmployeeProject,
}

impl Related<super::employee_project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmployeeProject.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        super::employee_project::Relation::Employee.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::employee_project::Relation::Project.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
