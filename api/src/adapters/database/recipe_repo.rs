//! Database adapter for RecipeRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::domain::entities::{
    DietaryKind, Ingredient, Recipe, RecipeContent, RecipeId, RecipeStub, VersionNumbers,
};
use crate::domain::ports::RecipeRepository;
use crate::entity::{
    recipe_dietary_specialities, recipe_ingredients, recipe_instructions, recipes,
};
use crate::error::DomainError;

/// SeaORM implementation of RecipeRepository
pub struct DbRecipeRepository {
    db: DatabaseConnection,
}

impl DbRecipeRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Insert ingredients, instructions and dietary specialities of a recipe
async fn insert_details(
    txn: &DatabaseTransaction,
    recipe_id: i32,
    content: &RecipeContent,
) -> Result<(), DomainError> {
    let speciality_rows: Vec<_> = content
        .dietary_specialities()
        .into_iter()
        .map(|(kind, name)| recipe_dietary_specialities::ActiveModel {
            recipe_id: Set(recipe_id),
            kind: Set(kind.to_string()),
            name: Set(name.to_string()),
            ..Default::default()
        })
        .collect();
    if !speciality_rows.is_empty() {
        recipe_dietary_specialities::Entity::insert_many(speciality_rows)
            .exec(txn)
            .await?;
    }

    let ingredient_rows: Vec<_> = content
        .ingredients
        .iter()
        .map(|i| recipe_ingredients::ActiveModel {
            recipe_id: Set(recipe_id),
            name: Set(i.name.clone()),
            ingredient_group: Set(i.ingredient_group.clone()),
            amount: Set(i.amount),
            unit: Set(i.unit.clone()),
            ..Default::default()
        })
        .collect();
    if !ingredient_rows.is_empty() {
        recipe_ingredients::Entity::insert_many(ingredient_rows)
            .exec(txn)
            .await?;
    }

    // Steps are numbered from 1
    let instruction_rows: Vec<_> = content
        .instructions
        .iter()
        .enumerate()
        .map(|(index, step)| recipe_instructions::ActiveModel {
            recipe_id: Set(recipe_id),
            step_number: Set(index as i32 + 1),
            instruction: Set(step.clone()),
            ..Default::default()
        })
        .collect();
    if !instruction_rows.is_empty() {
        recipe_instructions::Entity::insert_many(instruction_rows)
            .exec(txn)
            .await?;
    }

    Ok(())
}

async fn delete_details(txn: &DatabaseTransaction, recipe_id: i32) -> Result<(), DomainError> {
    recipe_dietary_specialities::Entity::delete_many()
        .filter(recipe_dietary_specialities::Column::RecipeId.eq(recipe_id))
        .exec(txn)
        .await?;
    recipe_ingredients::Entity::delete_many()
        .filter(recipe_ingredients::Column::RecipeId.eq(recipe_id))
        .exec(txn)
        .await?;
    recipe_instructions::Entity::delete_many()
        .filter(recipe_instructions::Column::RecipeId.eq(recipe_id))
        .exec(txn)
        .await?;

    Ok(())
}

fn recipe_not_found(id: &RecipeId) -> DomainError {
    DomainError::NotFound(format!("Recipe {}", id))
}

#[async_trait]
impl RecipeRepository for DbRecipeRepository {
    async fn create(&self, content: &RecipeContent) -> Result<RecipeId, DomainError> {
        let txn = self.db.begin().await?;

        let recipe = recipes::ActiveModel {
            name: Set(content.name.clone()),
            description: Set(content.description.clone()),
            number_of_people: Set(content.number_of_people),
            image_uri: Set(None),
            version: Set(0),
            image_version: Set(0),
            created_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        insert_details(&txn, recipe.id, content).await?;

        txn.commit().await?;

        Ok(RecipeId(recipe.id))
    }

    async fn find_by_id(&self, id: &RecipeId) -> Result<Option<Recipe>, DomainError> {
        let Some(model) = recipes::Entity::find_by_id(id.0).one(&self.db).await? else {
            return Ok(None);
        };

        let speciality_rows = recipe_dietary_specialities::Entity::find()
            .filter(recipe_dietary_specialities::Column::RecipeId.eq(model.id))
            .order_by_asc(recipe_dietary_specialities::Column::Id)
            .all(&self.db)
            .await?;

        let ingredient_rows = recipe_ingredients::Entity::find()
            .filter(recipe_ingredients::Column::RecipeId.eq(model.id))
            .order_by_asc(recipe_ingredients::Column::Id)
            .all(&self.db)
            .await?;

        let instruction_rows = recipe_instructions::Entity::find()
            .filter(recipe_instructions::Column::RecipeId.eq(model.id))
            .order_by_asc(recipe_instructions::Column::StepNumber)
            .all(&self.db)
            .await?;

        let mut specialities: HashMap<DietaryKind, Vec<String>> = HashMap::new();
        for row in speciality_rows {
            match row.kind.parse::<DietaryKind>() {
                Ok(kind) => specialities.entry(kind).or_default().push(row.name),
                Err(e) => tracing::warn!("Skipping dietary speciality of recipe {}: {}", id, e),
            }
        }

        Ok(Some(Recipe {
            id: RecipeId(model.id),
            version: model.version,
            image_version: model.image_version,
            image_uri: model.image_uri,
            content: RecipeContent {
                name: model.name,
                description: model.description,
                number_of_people: model.number_of_people,
                allergens: specialities.remove(&DietaryKind::Allergen).unwrap_or_default(),
                traces: specialities.remove(&DietaryKind::Trace).unwrap_or_default(),
                free_of_allergens: specialities.remove(&DietaryKind::FreeOf).unwrap_or_default(),
                instructions: instruction_rows.into_iter().map(|m| m.instruction).collect(),
                ingredients: ingredient_rows.into_iter().map(|m| m.into()).collect(),
            },
        }))
    }

    async fn exists(&self, id: &RecipeId) -> Result<bool, DomainError> {
        let count = recipes::Entity::find()
            .filter(recipes::Column::Id.eq(id.0))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    async fn replace_content(
        &self,
        id: &RecipeId,
        expected_version: i32,
        content: &RecipeContent,
    ) -> Result<i32, DomainError> {
        let txn = self.db.begin().await?;

        let result = recipes::Entity::update_many()
            .col_expr(
                recipes::Column::Version,
                Expr::col(recipes::Column::Version).add(1),
            )
            .col_expr(recipes::Column::Name, Expr::value(content.name.clone()))
            .col_expr(
                recipes::Column::Description,
                Expr::value(content.description.clone()),
            )
            .col_expr(
                recipes::Column::NumberOfPeople,
                Expr::value(content.number_of_people),
            )
            .filter(recipes::Column::Id.eq(id.0))
            .filter(recipes::Column::Version.eq(expected_version))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            let exists = recipes::Entity::find_by_id(id.0).one(&txn).await?.is_some();
            return Err(if exists {
                DomainError::Conflict(format!(
                    "Recipe {} was changed by someone else (expected version {})",
                    id, expected_version
                ))
            } else {
                recipe_not_found(id)
            });
        }

        delete_details(&txn, id.0).await?;
        insert_details(&txn, id.0, content).await?;

        txn.commit().await?;

        Ok(expected_version + 1)
    }

    async fn find_stubs(&self) -> Result<Vec<RecipeStub>, DomainError> {
        let results = recipes::Entity::find()
            .order_by_asc(recipes::Column::Name)
            .order_by_asc(recipes::Column::Id)
            .all(&self.db)
            .await?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn get_versions(&self, id: &RecipeId) -> Result<Option<VersionNumbers>, DomainError> {
        let result = recipes::Entity::find_by_id(id.0).one(&self.db).await?;

        Ok(result.map(|m| VersionNumbers {
            data_version: m.version,
            image_version: m.image_version,
        }))
    }

    async fn get_image_uri(&self, id: &RecipeId) -> Result<Option<String>, DomainError> {
        let recipe = recipes::Entity::find_by_id(id.0)
            .one(&self.db)
            .await?
            .ok_or_else(|| recipe_not_found(id))?;

        Ok(recipe.image_uri)
    }

    async fn set_image(&self, id: &RecipeId, image_uri: Option<&str>) -> Result<i32, DomainError> {
        let txn = self.db.begin().await?;

        let result = recipes::Entity::update_many()
            .col_expr(
                recipes::Column::ImageVersion,
                Expr::col(recipes::Column::ImageVersion).add(1),
            )
            .col_expr(
                recipes::Column::ImageUri,
                Expr::value(image_uri.map(str::to_string)),
            )
            .filter(recipes::Column::Id.eq(id.0))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(recipe_not_found(id));
        }

        let recipe = recipes::Entity::find_by_id(id.0)
            .one(&txn)
            .await?
            .ok_or_else(|| recipe_not_found(id))?;

        txn.commit().await?;

        Ok(recipe.image_version)
    }
}

/// Convert SeaORM model to domain entity
impl From<recipes::Model> for RecipeStub {
    fn from(model: recipes::Model) -> Self {
        RecipeStub {
            id: RecipeId(model.id),
            name: model.name,
            description: model.description,
            number_of_people: model.number_of_people,
            version: model.version,
            image_version: model.image_version,
        }
    }
}

impl From<recipe_ingredients::Model> for Ingredient {
    fn from(model: recipe_ingredients::Model) -> Self {
        Ingredient {
            name: model.name,
            ingredient_group: model.ingredient_group,
            amount: model.amount,
            unit: model.unit,
        }
    }
}
