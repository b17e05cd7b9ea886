//! `SeaORM` Entity for the `allergens` table
//!
//! One row per allergen of an allergen person; `traces` marks allergens the
//! person only reacts to in larger amounts.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "allergens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub allergen_person_id: i32,
    pub allergen: String,
    pub traces: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::allergen_people::Entity",
        from = "Column::AllergenPersonId",
        to = "super::allergen_people::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    AllergenPeople,
}

impl Related<super::allergen_people::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AllergenPeople.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
