//! Database adapter for ProjectRepository
//!
//! A project row owns its meals, allergen people (with their allergens),
//! scheduled recipes, unit conversions and person number changes. Writes to
//! the nested plan always replace it as a whole inside one transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
    TransactionTrait,
};

use crate::domain::entities::{
    AllergenPerson, LeaveOutcome, PersonNumberChange, Project, ProjectContent, ProjectId,
    ProjectStub, RecipeForProject, RecipeId, UnitConversion, UserId, VersionNumbers,
};
use crate::domain::ports::ProjectRepository;
use crate::entity::{
    allergen_people, allergens, meals, person_number_changes, project_participants,
    project_recipes, projects, unit_conversions,
};
use crate::error::DomainError;

/// SeaORM implementation of ProjectRepository
pub struct DbProjectRepository {
    db: DatabaseConnection,
}

impl DbProjectRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Assemble the full plan of a loaded project row
    async fn load_project(&self, model: projects::Model) -> Result<Project, DomainError> {
        let meal_rows = meals::Entity::find()
            .filter(meals::Column::ProjectId.eq(model.id))
            .order_by_asc(meals::Column::Sequence)
            .all(&self.db)
            .await?;

        let people = allergen_people::Entity::find()
            .filter(allergen_people::Column::ProjectId.eq(model.id))
            .order_by_asc(allergen_people::Column::Id)
            .all(&self.db)
            .await?;

        let person_ids: Vec<i32> = people.iter().map(|p| p.id).collect();
        let allergen_rows = if person_ids.is_empty() {
            Vec::new()
        } else {
            allergens::Entity::find()
                .filter(allergens::Column::AllergenPersonId.is_in(person_ids))
                .order_by_asc(allergens::Column::Id)
                .all(&self.db)
                .await?
        };

        // (allergens, traces) per person
        let mut by_person: HashMap<i32, (Vec<String>, Vec<String>)> = HashMap::new();
        for row in allergen_rows {
            let entry = by_person.entry(row.allergen_person_id).or_default();
            if row.traces {
                entry.1.push(row.allergen);
            } else {
                entry.0.push(row.allergen);
            }
        }

        let recipe_rows = project_recipes::Entity::find()
            .filter(project_recipes::Column::ProjectId.eq(model.id))
            .order_by_asc(project_recipes::Column::Id)
            .all(&self.db)
            .await?;

        let conversion_rows = unit_conversions::Entity::find()
            .filter(unit_conversions::Column::ProjectId.eq(model.id))
            .order_by_asc(unit_conversions::Column::Id)
            .all(&self.db)
            .await?;

        let change_rows = person_number_changes::Entity::find()
            .filter(person_number_changes::Column::ProjectId.eq(model.id))
            .order_by_asc(person_number_changes::Column::Id)
            .all(&self.db)
            .await?;

        let allergen_people = people
            .into_iter()
            .map(|p| {
                let (allergens, traces) = by_person.remove(&p.id).unwrap_or_default();
                AllergenPerson {
                    name: p.name,
                    arrival_date: p.arrival_date,
                    departure_date: p.departure_date,
                    arrival_meal: p.arrival_meal,
                    departure_meal: p.departure_meal,
                    allergens,
                    traces,
                }
            })
            .collect();

        Ok(Project {
            id: ProjectId(model.id),
            project_version: model.project_version,
            image_version: model.image_version,
            image_uri: model.image_uri,
            content: ProjectContent {
                name: model.name,
                start_date: model.start_date,
                end_date: model.end_date,
                meals: meal_rows.into_iter().map(|m| m.name).collect(),
                allergen_people,
                recipes: recipe_rows.into_iter().map(|m| m.into()).collect(),
                unit_conversions: conversion_rows.into_iter().map(|m| m.into()).collect(),
                person_number_changes: change_rows.into_iter().map(|m| m.into()).collect(),
            },
        })
    }
}

/// Insert the nested plan of a project
async fn insert_content(
    txn: &DatabaseTransaction,
    project_id: i32,
    content: &ProjectContent,
) -> Result<(), DomainError> {
    let meal_rows: Vec<_> = content
        .meals
        .iter()
        .enumerate()
        .map(|(sequence, name)| meals::ActiveModel {
            project_id: Set(project_id),
            name: Set(name.clone()),
            sequence: Set(sequence as i32),
            ..Default::default()
        })
        .collect();
    if !meal_rows.is_empty() {
        meals::Entity::insert_many(meal_rows).exec(txn).await?;
    }

    for person in &content.allergen_people {
        let inserted = allergen_people::ActiveModel {
            project_id: Set(project_id),
            name: Set(person.name.clone()),
            arrival_date: Set(person.arrival_date),
            departure_date: Set(person.departure_date),
            arrival_meal: Set(person.arrival_meal.clone()),
            departure_meal: Set(person.departure_meal.clone()),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        let allergen_rows: Vec<_> = person
            .allergens
            .iter()
            .map(|a| (a, false))
            .chain(person.traces.iter().map(|a| (a, true)))
            .map(|(allergen, traces)| allergens::ActiveModel {
                allergen_person_id: Set(inserted.id),
                allergen: Set(allergen.clone()),
                traces: Set(traces),
                ..Default::default()
            })
            .collect();
        if !allergen_rows.is_empty() {
            allergens::Entity::insert_many(allergen_rows).exec(txn).await?;
        }
    }

    let recipe_rows: Vec<_> = content
        .recipes
        .iter()
        .map(|r| project_recipes::ActiveModel {
            project_id: Set(project_id),
            recipe_id: Set(r.recipe_id.0),
            date: Set(r.date),
            meal: Set(r.meal.clone()),
            main_recipe: Set(r.main_recipe),
            ..Default::default()
        })
        .collect();
    if !recipe_rows.is_empty() {
        project_recipes::Entity::insert_many(recipe_rows)
            .exec(txn)
            .await?;
    }

    let conversion_rows: Vec<_> = content
        .unit_conversions
        .iter()
        .map(|c| unit_conversions::ActiveModel {
            project_id: Set(project_id),
            start_unit: Set(c.start_unit.clone()),
            end_unit: Set(c.end_unit.clone()),
            ingredient: Set(c.ingredient.clone()),
            factor: Set(c.factor),
            ..Default::default()
        })
        .collect();
    if !conversion_rows.is_empty() {
        unit_conversions::Entity::insert_many(conversion_rows)
            .exec(txn)
            .await?;
    }

    let change_rows: Vec<_> = content
        .person_number_changes
        .iter()
        .map(|c| person_number_changes::ActiveModel {
            project_id: Set(project_id),
            date: Set(c.date),
            meal: Set(c.meal.clone()),
            difference_before: Set(c.difference_before),
            ..Default::default()
        })
        .collect();
    if !change_rows.is_empty() {
        person_number_changes::Entity::insert_many(change_rows)
            .exec(txn)
            .await?;
    }

    Ok(())
}

/// Delete the nested plan of a project, children before parents
async fn delete_content(txn: &DatabaseTransaction, project_id: i32) -> Result<(), DomainError> {
    let person_ids: Vec<i32> = allergen_people::Entity::find()
        .filter(allergen_people::Column::ProjectId.eq(project_id))
        .all(txn)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    if !person_ids.is_empty() {
        allergens::Entity::delete_many()
            .filter(allergens::Column::AllergenPersonId.is_in(person_ids))
            .exec(txn)
            .await?;
    }

    allergen_people::Entity::delete_many()
        .filter(allergen_people::Column::ProjectId.eq(project_id))
        .exec(txn)
        .await?;
    project_recipes::Entity::delete_many()
        .filter(project_recipes::Column::ProjectId.eq(project_id))
        .exec(txn)
        .await?;
    unit_conversions::Entity::delete_many()
        .filter(unit_conversions::Column::ProjectId.eq(project_id))
        .exec(txn)
        .await?;
    person_number_changes::Entity::delete_many()
        .filter(person_number_changes::Column::ProjectId.eq(project_id))
        .exec(txn)
        .await?;
    meals::Entity::delete_many()
        .filter(meals::Column::ProjectId.eq(project_id))
        .exec(txn)
        .await?;

    Ok(())
}

/// Delete a project with its plan and participants, returning whether it existed
async fn delete_project(txn: &DatabaseTransaction, project_id: i32) -> Result<bool, DomainError> {
    delete_content(txn, project_id).await?;
    project_participants::Entity::delete_many()
        .filter(project_participants::Column::ProjectId.eq(project_id))
        .exec(txn)
        .await?;
    let result = projects::Entity::delete_by_id(project_id).exec(txn).await?;

    Ok(result.rows_affected > 0)
}

fn project_not_found(id: &ProjectId) -> DomainError {
    DomainError::NotFound(format!("Project {}", id))
}

#[async_trait]
impl ProjectRepository for DbProjectRepository {
    async fn create(
        &self,
        content: &ProjectContent,
        owner: &UserId,
    ) -> Result<ProjectId, DomainError> {
        let now = Utc::now().fixed_offset();
        let txn = self.db.begin().await?;

        let project = projects::ActiveModel {
            name: Set(content.name.clone()),
            start_date: Set(content.start_date),
            end_date: Set(content.end_date),
            image_uri: Set(None),
            invitation_token: Set(None),
            project_version: Set(0),
            image_version: Set(0),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        insert_content(&txn, project.id, content).await?;

        project_participants::ActiveModel {
            project_id: Set(project.id),
            user_id: Set(owner.0),
            joined_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok(ProjectId(project.id))
    }

    async fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>, DomainError> {
        match projects::Entity::find_by_id(id.0).one(&self.db).await? {
            Some(model) => Ok(Some(self.load_project(model).await?)),
            None => Ok(None),
        }
    }

    async fn replace_content(
        &self,
        id: &ProjectId,
        expected_version: i32,
        content: &ProjectContent,
    ) -> Result<i32, DomainError> {
        let txn = self.db.begin().await?;

        let result = projects::Entity::update_many()
            .col_expr(
                projects::Column::ProjectVersion,
                Expr::col(projects::Column::ProjectVersion).add(1),
            )
            .col_expr(projects::Column::Name, Expr::value(content.name.clone()))
            .col_expr(projects::Column::StartDate, Expr::value(content.start_date))
            .col_expr(projects::Column::EndDate, Expr::value(content.end_date))
            .filter(projects::Column::Id.eq(id.0))
            .filter(projects::Column::ProjectVersion.eq(expected_version))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            let exists = projects::Entity::find_by_id(id.0).one(&txn).await?.is_some();
            return Err(if exists {
                DomainError::Conflict(format!(
                    "Project {} was changed by someone else (expected version {})",
                    id, expected_version
                ))
            } else {
                project_not_found(id)
            });
        }

        delete_content(&txn, id.0).await?;
        insert_content(&txn, id.0, content).await?;

        txn.commit().await?;

        Ok(expected_version + 1)
    }

    async fn delete(&self, id: &ProjectId) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        if !delete_project(&txn, id.0).await? {
            return Err(project_not_found(id));
        }

        txn.commit().await?;
        Ok(())
    }

    async fn find_stubs_by_participant(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ProjectStub>, DomainError> {
        let results = projects::Entity::find()
            .join(
                JoinType::InnerJoin,
                projects::Relation::ProjectParticipants.def(),
            )
            .filter(project_participants::Column::UserId.eq(user_id.0))
            .order_by_asc(projects::Column::Id)
            .all(&self.db)
            .await?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn get_versions(&self, id: &ProjectId) -> Result<Option<VersionNumbers>, DomainError> {
        let result = projects::Entity::find_by_id(id.0).one(&self.db).await?;

        Ok(result.map(|m| VersionNumbers {
            data_version: m.project_version,
            image_version: m.image_version,
        }))
    }

    async fn is_participant(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
    ) -> Result<bool, DomainError> {
        let result = project_participants::Entity::find()
            .filter(project_participants::Column::ProjectId.eq(project_id.0))
            .filter(project_participants::Column::UserId.eq(user_id.0))
            .one(&self.db)
            .await?;

        Ok(result.is_some())
    }

    async fn add_participant(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
    ) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        // Waits for a concurrent `leave` of the last participant
        projects::Entity::find_by_id(project_id.0)
            .lock_shared()
            .one(&txn)
            .await?
            .ok_or_else(|| project_not_found(project_id))?;

        let existing = project_participants::Entity::find()
            .filter(project_participants::Column::ProjectId.eq(project_id.0))
            .filter(project_participants::Column::UserId.eq(user_id.0))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        let result = project_participants::ActiveModel {
            project_id: Set(project_id.0),
            user_id: Set(user_id.0),
            joined_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&txn)
        .await;

        match result {
            Ok(_) => {
                txn.commit().await?;
                Ok(())
            }
            // Joined concurrently
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn leave(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
    ) -> Result<LeaveOutcome, DomainError> {
        let txn = self.db.begin().await?;

        let Some(project) = projects::Entity::find_by_id(project_id.0)
            .lock_exclusive()
            .one(&txn)
            .await?
        else {
            return Ok(LeaveOutcome::NotParticipant);
        };

        let removed = project_participants::Entity::delete_many()
            .filter(project_participants::Column::ProjectId.eq(project_id.0))
            .filter(project_participants::Column::UserId.eq(user_id.0))
            .exec(&txn)
            .await?;
        if removed.rows_affected == 0 {
            return Ok(LeaveOutcome::NotParticipant);
        }

        let remaining = project_participants::Entity::find()
            .filter(project_participants::Column::ProjectId.eq(project_id.0))
            .count(&txn)
            .await?;

        let outcome = if remaining > 0 {
            LeaveOutcome::Left
        } else {
            delete_project(&txn, project_id.0).await?;
            LeaveOutcome::Deleted {
                image_uri: project.image_uri,
            }
        };

        txn.commit().await?;
        Ok(outcome)
    }

    async fn count_participants(&self, project_id: &ProjectId) -> Result<u64, DomainError> {
        let count = project_participants::Entity::find()
            .filter(project_participants::Column::ProjectId.eq(project_id.0))
            .count(&self.db)
            .await?;

        Ok(count)
    }

    async fn get_invitation_token(&self, id: &ProjectId) -> Result<Option<String>, DomainError> {
        let project = projects::Entity::find_by_id(id.0)
            .one(&self.db)
            .await?
            .ok_or_else(|| project_not_found(id))?;

        Ok(project.invitation_token)
    }

    async fn set_invitation_token(&self, id: &ProjectId, token: &str) -> Result<(), DomainError> {
        let result = projects::Entity::update_many()
            .col_expr(
                projects::Column::InvitationToken,
                Expr::value(token.to_string()),
            )
            .filter(projects::Column::Id.eq(id.0))
            .filter(projects::Column::InvitationToken.is_null())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            // Either unknown or the token was set already
            projects::Entity::find_by_id(id.0)
                .one(&self.db)
                .await?
                .ok_or_else(|| project_not_found(id))?;
        }

        Ok(())
    }

    async fn find_by_invitation_token(
        &self,
        token: &str,
    ) -> Result<Option<ProjectId>, DomainError> {
        let result = projects::Entity::find()
            .filter(projects::Column::InvitationToken.eq(token))
            .one(&self.db)
            .await?;

        Ok(result.map(|m| ProjectId(m.id)))
    }

    async fn get_image_uri(&self, id: &ProjectId) -> Result<Option<String>, DomainError> {
        let project = projects::Entity::find_by_id(id.0)
            .one(&self.db)
            .await?
            .ok_or_else(|| project_not_found(id))?;

        Ok(project.image_uri)
    }

    async fn set_image(&self, id: &ProjectId, image_uri: Option<&str>) -> Result<i32, DomainError> {
        let txn = self.db.begin().await?;

        let result = projects::Entity::update_many()
            .col_expr(
                projects::Column::ImageVersion,
                Expr::col(projects::Column::ImageVersion).add(1),
            )
            .col_expr(
                projects::Column::ImageUri,
                Expr::value(image_uri.map(str::to_string)),
            )
            .filter(projects::Column::Id.eq(id.0))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(project_not_found(id));
        }

        let project = projects::Entity::find_by_id(id.0)
            .one(&txn)
            .await?
            .ok_or_else(|| project_not_found(id))?;

        txn.commit().await?;

        Ok(project.image_version)
    }
}

/// Convert SeaORM model to domain entity
impl From<projects::Model> for ProjectStub {
    fn from(model: projects::Model) -> Self {
        ProjectStub {
            id: ProjectId(model.id),
            name: model.name,
            image_uri: model.image_uri,
            project_version: model.project_version,
            image_version: model.image_version,
        }
    }
}

impl From<project_recipes::Model> for RecipeForProject {
    fn from(model: project_recipes::Model) -> Self {
        RecipeForProject {
            date: model.date,
            meal: model.meal,
            recipe_id: RecipeId(model.recipe_id),
            main_recipe: model.main_recipe,
        }
    }
}

impl From<unit_conversions::Model> for UnitConversion {
    fn from(model: unit_conversions::Model) -> Self {
        UnitConversion {
            start_unit: model.start_unit,
            end_unit: model.end_unit,
            ingredient: model.ingredient,
            factor: model.factor,
        }
    }
}

impl From<person_number_changes::Model> for PersonNumberChange {
    fn from(model: person_number_changes::Model) -> Self {
        PersonNumberChange {
            date: model.date,
            meal: model.meal,
            difference_before: model.difference_before,
        }
    }
}
