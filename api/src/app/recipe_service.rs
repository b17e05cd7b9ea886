//! Recipe service
//!
//! The recipe catalogue is shared by all users.

use std::sync::Arc;

use crate::domain::entities::{Recipe, RecipeContent, RecipeId, RecipeStub, VersionNumbers};
use crate::domain::ports::RecipeRepository;
use crate::error::{AppError, DomainError};

/// Service for the recipe catalogue
pub struct RecipeService<RR>
where
    RR: RecipeRepository,
{
    recipes: Arc<RR>,
}

impl<RR> RecipeService<RR>
where
    RR: RecipeRepository,
{
    pub fn new(recipes: Arc<RR>) -> Self {
        Self { recipes }
    }

    pub async fn create_recipe(&self, content: &RecipeContent) -> Result<RecipeId, AppError> {
        content.validate()?;

        let id = self.recipes.create(content).await?;

        tracing::info!("Created recipe {} ({})", content.name, id);
        Ok(id)
    }

    pub async fn get_recipe(&self, id: &RecipeId) -> Result<Recipe, AppError> {
        self.recipes
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Replace a recipe if nobody changed it since `expected_version`
    pub async fn update_recipe(
        &self,
        id: &RecipeId,
        expected_version: i32,
        content: &RecipeContent,
    ) -> Result<i32, AppError> {
        content.validate()?;

        let version = self
            .recipes
            .replace_content(id, expected_version, content)
            .await?;

        tracing::debug!("Recipe {} updated to version {}", id, version);
        Ok(version)
    }

    pub async fn list_recipe_stubs(&self) -> Result<Vec<RecipeStub>, AppError> {
        Ok(self.recipes.find_stubs().await?)
    }

    pub async fn get_versions(&self, id: &RecipeId) -> Result<VersionNumbers, AppError> {
        self.recipes
            .get_versions(id)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: &RecipeId) -> AppError {
    DomainError::NotFound(format!("Recipe {} not found", id)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_recipe_content, test_recipe_content_named, InMemoryRecipeRepository};

    fn create_service() -> RecipeService<InMemoryRecipeRepository> {
        RecipeService::new(Arc::new(InMemoryRecipeRepository::new()))
    }

    #[tokio::test]
    async fn create_and_get_recipe() {
        let service = create_service();

        let id = service.create_recipe(&test_recipe_content()).await.unwrap();
        let recipe = service.get_recipe(&id).await.unwrap();

        assert_eq!(recipe.content, test_recipe_content());
        assert_eq!(recipe.version, 0);
    }

    #[tokio::test]
    async fn create_rejects_invalid_recipe() {
        let service = create_service();
        let mut content = test_recipe_content();
        content.number_of_people = 0;

        assert!(matches!(
            service.create_recipe(&content).await,
            Err(AppError::Domain(DomainError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn get_unknown_recipe_is_not_found() {
        let service = create_service();

        assert!(matches!(
            service.get_recipe(&RecipeId(5)).await,
            Err(AppError::Domain(DomainError::NotFound(_)))
        ));
        assert!(matches!(
            service.get_versions(&RecipeId(5)).await,
            Err(AppError::Domain(DomainError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn update_uses_optimistic_locking() {
        let service = create_service();
        let id = service.create_recipe(&test_recipe_content()).await.unwrap();

        let renamed = test_recipe_content_named("Spaghetti Carbonara");
        assert_eq!(service.update_recipe(&id, 0, &renamed).await.unwrap(), 1);

        let stale = service.update_recipe(&id, 0, &test_recipe_content()).await;
        assert!(matches!(
            stale,
            Err(AppError::Domain(DomainError::Conflict(_)))
        ));

        let versions = service.get_versions(&id).await.unwrap();
        assert_eq!(versions.data_version, 1);
        assert_eq!(
            service.get_recipe(&id).await.unwrap().content.name,
            "Spaghetti Carbonara"
        );
    }

    #[tokio::test]
    async fn stubs_are_sorted_by_name() {
        let service = create_service();
        service
            .create_recipe(&test_recipe_content_named("Porridge"))
            .await
            .unwrap();
        service
            .create_recipe(&test_recipe_content_named("Chili"))
            .await
            .unwrap();

        let names: Vec<_> = service
            .list_recipe_stubs()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();

        assert_eq!(names, vec!["Chili", "Porridge"]);
    }
}
