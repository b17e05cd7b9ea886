//! Schema creation
//!
//! Tables are derived from the SeaORM entities and created if missing, parents
//! before children so foreign keys resolve.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};

use crate::entity::{
    allergen_people, allergens, credentials, meals, person_number_changes, project_participants,
    project_recipes, projects, recipe_dietary_specialities, recipe_ingredients,
    recipe_instructions, recipes, sessions, unit_conversions, users,
};

/// Create all tables that do not exist yet
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, users::Entity).await?;
    create_table(db, &schema, credentials::Entity).await?;
    create_table(db, &schema, sessions::Entity).await?;

    create_table(db, &schema, recipes::Entity).await?;
    create_table(db, &schema, recipe_dietary_specialities::Entity).await?;
    create_table(db, &schema, recipe_ingredients::Entity).await?;
    create_table(db, &schema, recipe_instructions::Entity).await?;

    create_table(db, &schema, projects::Entity).await?;
    create_table(db, &schema, project_participants::Entity).await?;
    create_table(db, &schema, meals::Entity).await?;
    create_table(db, &schema, allergen_people::Entity).await?;
    create_table(db, &schema, allergens::Entity).await?;
    create_table(db, &schema, project_recipes::Entity).await?;
    create_table(db, &schema, unit_conversions::Entity).await?;
    create_table(db, &schema, person_number_changes::Entity).await?;

    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let table = entity.table_name().to_owned();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(db.get_database_backend().build(&stmt)).await?;
    tracing::debug!("Ensured table {}", table);
    Ok(())
}
