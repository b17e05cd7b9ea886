//! `SeaORM` Entity for the `projects` table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub image_uri: Option<String>,
    #[sea_orm(unique)]
    pub invitation_token: Option<String>,
    pub project_version: i32,
    pub image_version: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::project_participants::Entity")]
    ProjectParticipants,
}

impl Related<super::project_participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectParticipants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
