//! SeaORM entities
//!
//! Table definitions used by the database adapters. The schema is created
//! from these definitions on start-up (see `adapters::database::schema`).

pub mod allergen_people;
pub mod allergens;
pub mod credentials;
pub mod meals;
pub mod person_number_changes;
pub mod project_participants;
pub mod project_recipes;
pub mod projects;
pub mod recipe_dietary_specialities;
pub mod recipe_ingredients;
pub mod recipe_instructions;
pub mod recipes;
pub mod sessions;
pub mod unit_conversions;
pub mod users;
