//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use chrono::{NaiveDate, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::adapters::database::create_schema;
use crate::domain::entities::{
    AllergenPerson, Ingredient, PersonNumberChange, ProjectContent, RecipeContent,
    RecipeForProject, RecipeId, UnitConversion, User, UserId,
};

/// A date in July 2024, the month of the fixture campout
pub fn july(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, day).expect("valid July date")
}

/// Fresh in-memory SQLite database with the full schema
///
/// A single pooled connection keeps every query on the same in-memory database.
pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    create_schema(&db).await.expect("Failed to create schema");
    db
}

/// Create a test user with default values
pub fn test_user() -> User {
    test_user_named(1, "anna")
}

/// Create a test user with a specific id and name
pub fn test_user_named(id: i32, name: &str) -> User {
    User {
        id: UserId(id),
        name: name.to_string(),
        created_at: Utc::now(),
    }
}

/// Create a valid recipe
pub fn test_recipe_content() -> RecipeContent {
    test_recipe_content_named("Spaghetti Bolognese")
}

/// Create a valid recipe with a specific name
pub fn test_recipe_content_named(name: &str) -> RecipeContent {
    RecipeContent {
        name: name.to_string(),
        description: "Klassiker für große Gruppen".to_string(),
        number_of_people: 10,
        allergens: vec!["Gluten".to_string()],
        traces: vec!["Sellerie".to_string()],
        free_of_allergens: vec!["Nüsse".to_string()],
        instructions: vec![
            "Zwiebeln anbraten".to_string(),
            "Hackfleisch dazugeben".to_string(),
            "Nudeln kochen".to_string(),
        ],
        ingredients: vec![
            Ingredient {
                name: "Spaghetti".to_string(),
                ingredient_group: "Trockenwaren".to_string(),
                amount: 1000.0,
                unit: "g".to_string(),
            },
            Ingredient {
                name: "Hackfleisch".to_string(),
                ingredient_group: "Kühlware".to_string(),
                amount: 1.5,
                unit: "kg".to_string(),
            },
        ],
    }
}

/// Create a valid project plan without scheduled recipes
pub fn test_project_content() -> ProjectContent {
    ProjectContent {
        name: "Sommerlager".to_string(),
        start_date: july(22),
        end_date: july(26),
        meals: vec![
            "Frühstück".to_string(),
            "Mittagessen".to_string(),
            "Abendessen".to_string(),
        ],
        allergen_people: vec![AllergenPerson {
            name: "Bob".to_string(),
            arrival_date: july(22),
            departure_date: july(25),
            arrival_meal: "Abendessen".to_string(),
            departure_meal: "Frühstück".to_string(),
            allergens: vec!["Ei".to_string()],
            traces: vec!["Laktose".to_string()],
        }],
        recipes: Vec::new(),
        unit_conversions: vec![UnitConversion {
            start_unit: "EL".to_string(),
            end_unit: "g".to_string(),
            ingredient: "Zucker".to_string(),
            factor: 15.0,
        }],
        person_number_changes: vec![PersonNumberChange {
            date: july(24),
            meal: "Mittagessen".to_string(),
            difference_before: 5,
        }],
    }
}

/// Create a valid project plan with `recipe_id` as main recipe of one slot
pub fn test_project_content_with_recipe(recipe_id: RecipeId) -> ProjectContent {
    ProjectContent {
        recipes: vec![RecipeForProject {
            date: july(23),
            meal: "Mittagessen".to_string(),
            recipe_id,
            main_recipe: true,
        }],
        ..test_project_content()
    }
}
