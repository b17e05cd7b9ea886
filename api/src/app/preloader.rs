//! Demo data
//!
//! Seeds a `demo` user with one recipe and the "Testprojekt" campout so a
//! fresh installation has something to look at.

use std::sync::Arc;

use chrono::NaiveDate;

use super::auth_service::hash_password;
use crate::domain::entities::{
    AllergenPerson, Ingredient, NewUser, ProjectContent, ProjectId, RecipeContent,
    RecipeForProject, RecipeId,
};
use crate::domain::ports::{ProjectRepository, RecipeRepository, UserRepository};
use crate::error::AppError;

pub const DEMO_USER: &str = "demo";

/// Inserts the demo data on start-up
pub struct Preloader<UR, PR, RR>
where
    UR: UserRepository,
    PR: ProjectRepository,
    RR: RecipeRepository,
{
    users: Arc<UR>,
    projects: Arc<PR>,
    recipes: Arc<RR>,
}

impl<UR, PR, RR> Preloader<UR, PR, RR>
where
    UR: UserRepository,
    PR: ProjectRepository,
    RR: RecipeRepository,
{
    pub fn new(users: Arc<UR>, projects: Arc<PR>, recipes: Arc<RR>) -> Self {
        Self {
            users,
            projects,
            recipes,
        }
    }

    /// Insert the demo data unless the demo user already has a project.
    ///
    /// A user or recipe left behind by an interrupted run is reused.
    /// Returns the id of the inserted project.
    pub async fn seed(&self, demo_password: Option<&str>) -> Result<Option<ProjectId>, AppError> {
        let Some(password) = demo_password else {
            tracing::warn!("DEMO_PASSWORD is not set, skipping demo data");
            return Ok(None);
        };

        let user = match self.users.find_by_name(DEMO_USER).await? {
            Some(user) => {
                if !self.projects.find_stubs_by_participant(&user.id).await?.is_empty() {
                    tracing::debug!("Demo data already present");
                    return Ok(None);
                }
                tracing::info!("Completing demo data for existing user {}", user.name);
                user
            }
            None => {
                self.users
                    .create(&NewUser {
                        name: DEMO_USER.to_string(),
                        password_hash: hash_password(password).await?,
                    })
                    .await?
            }
        };

        let recipe_id = self.demo_recipe_id().await?;

        let project = demo_project(date(22)?, date(28)?, recipe_id)?;
        project.validate()?;
        let project_id = self.projects.create(&project, &user.id).await?;

        tracing::info!(
            "Inserted demo project {} with recipe {} for user {}",
            project_id,
            recipe_id,
            user.name
        );
        Ok(Some(project_id))
    }

    async fn demo_recipe_id(&self) -> Result<RecipeId, AppError> {
        let recipe = demo_recipe();
        let existing = self
            .recipes
            .find_stubs()
            .await?
            .into_iter()
            .find(|stub| stub.name == recipe.name);

        match existing {
            Some(stub) => Ok(stub.id),
            None => {
                recipe.validate()?;
                Ok(self.recipes.create(&recipe).await?)
            }
        }
    }
}

fn date(day: u32) -> Result<NaiveDate, AppError> {
    NaiveDate::from_ymd_opt(2024, 7, day)
        .ok_or_else(|| AppError::Internal(format!("Invalid demo date 2024-07-{}", day)))
}

fn demo_recipe() -> RecipeContent {
    RecipeContent {
        name: "Chili sin Carne".to_string(),
        description: "Deftiger Eintopf für das Lagerfeuer".to_string(),
        number_of_people: 20,
        allergens: vec!["Sellerie".to_string()],
        traces: Vec::new(),
        free_of_allergens: vec!["Laktose".to_string(), "Ei".to_string()],
        instructions: vec![
            "Zwiebeln und Paprika würfeln und anbraten".to_string(),
            "Bohnen, Mais und Tomaten dazugeben".to_string(),
            "Eine Stunde köcheln lassen und abschmecken".to_string(),
        ],
        ingredients: vec![
            ingredient("Kidneybohnen", "Konserven", 2.0, "kg"),
            ingredient("Mais", "Konserven", 1.0, "kg"),
            ingredient("Tomaten", "Konserven", 2.5, "kg"),
            ingredient("Zwiebeln", "Gemüse", 1.0, "kg"),
        ],
    }
}

fn ingredient(name: &str, group: &str, amount: f64, unit: &str) -> Ingredient {
    Ingredient {
        name: name.to_string(),
        ingredient_group: group.to_string(),
        amount,
        unit: unit.to_string(),
    }
}

fn demo_project(
    start_date: NaiveDate,
    end_date: NaiveDate,
    recipe_id: RecipeId,
) -> Result<ProjectContent, AppError> {
    Ok(ProjectContent {
        name: "Testprojekt".to_string(),
        start_date,
        end_date,
        meals: vec!["Mittagessen".to_string(), "Abendessen".to_string()],
        allergen_people: vec![AllergenPerson {
            name: "Bob".to_string(),
            arrival_date: start_date,
            departure_date: date(25)?,
            arrival_meal: "Mittagessen".to_string(),
            departure_meal: "Abendessen".to_string(),
            allergens: vec!["Ei".to_string()],
            traces: vec!["Laktose".to_string()],
        }],
        recipes: vec![RecipeForProject {
            date: start_date,
            meal: "Abendessen".to_string(),
            recipe_id,
            main_recipe: true,
        }],
        unit_conversions: Vec::new(),
        person_number_changes: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::auth_service::verify_password;
    use crate::test_utils::{
        test_user_named, InMemoryProjectRepository, InMemoryRecipeRepository,
        InMemoryUserRepository,
    };

    type TestPreloader =
        Preloader<InMemoryUserRepository, InMemoryProjectRepository, InMemoryRecipeRepository>;

    fn create_preloader(
        users: InMemoryUserRepository,
    ) -> (
        TestPreloader,
        Arc<InMemoryUserRepository>,
        Arc<InMemoryProjectRepository>,
    ) {
        let users = Arc::new(users);
        let projects = Arc::new(InMemoryProjectRepository::new());
        let preloader = Preloader::new(
            users.clone(),
            projects.clone(),
            Arc::new(InMemoryRecipeRepository::new()),
        );
        (preloader, users, projects)
    }

    #[tokio::test]
    async fn seeds_demo_user_and_project() {
        let (preloader, users, projects) = create_preloader(InMemoryUserRepository::new());

        let id = preloader.seed(Some("demo-passwort")).await.unwrap().unwrap();

        let demo = users.find_by_name(DEMO_USER).await.unwrap().unwrap();
        let hash = users.get_password_hash(&demo.id).await.unwrap().unwrap();
        assert!(verify_password("demo-passwort", &hash).await.unwrap());

        let project = projects.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(project.content.name, "Testprojekt");
        assert_eq!(project.content.meals, vec!["Mittagessen", "Abendessen"]);
        assert_eq!(project.content.allergen_people[0].allergens, vec!["Ei"]);
        assert_eq!(project.content.allergen_people[0].traces, vec!["Laktose"]);
        assert!(projects.is_participant(&id, &demo.id).await.unwrap());
    }

    #[tokio::test]
    async fn seeding_twice_is_a_no_op() {
        let (preloader, _, projects) = create_preloader(InMemoryUserRepository::new());

        assert!(preloader.seed(Some("demo-passwort")).await.unwrap().is_some());
        assert!(preloader.seed(Some("demo-passwort")).await.unwrap().is_none());

        let demo = test_user_named(1, DEMO_USER);
        assert_eq!(
            projects.find_stubs_by_participant(&demo.id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn skips_without_password() {
        let (preloader, users, _) = create_preloader(InMemoryUserRepository::new());

        assert!(preloader.seed(None).await.unwrap().is_none());
        assert!(users.find_by_name(DEMO_USER).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn seeding_resumes_after_a_failed_run() {
        let users = Arc::new(InMemoryUserRepository::new());
        let projects = Arc::new(InMemoryProjectRepository::new());
        let recipes = Arc::new(InMemoryRecipeRepository::failing());
        let preloader = Preloader::new(users.clone(), projects.clone(), recipes.clone());

        assert!(preloader.seed(Some("demo-passwort")).await.is_err());
        let demo = users.find_by_name(DEMO_USER).await.unwrap().unwrap();
        assert!(projects
            .find_stubs_by_participant(&demo.id)
            .await
            .unwrap()
            .is_empty());

        recipes.recover();
        let id = preloader.seed(Some("demo-passwort")).await.unwrap().unwrap();

        let stubs = projects.find_stubs_by_participant(&demo.id).await.unwrap();
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].id, id);
        assert_eq!(recipes.find_stubs().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn seeding_reuses_an_existing_demo_recipe() {
        let recipes = Arc::new(InMemoryRecipeRepository::new());
        let recipe_id = recipes.create(&demo_recipe()).await.unwrap();
        let projects = Arc::new(InMemoryProjectRepository::new());
        let preloader = Preloader::new(
            Arc::new(InMemoryUserRepository::new()),
            projects.clone(),
            recipes.clone(),
        );

        let id = preloader.seed(Some("demo-passwort")).await.unwrap().unwrap();

        let project = projects.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(project.content.recipes[0].recipe_id, recipe_id);
        assert_eq!(recipes.find_stubs().await.unwrap().len(), 1);
    }

    #[test]
    fn demo_content_is_valid() {
        let project = demo_project(date(22).unwrap(), date(28).unwrap(), RecipeId(1)).unwrap();
        assert!(project.validate().is_ok());
        assert!(demo_recipe().validate().is_ok());
    }
}
