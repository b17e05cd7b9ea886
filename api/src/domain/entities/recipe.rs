//! Recipe domain entity
//!
//! Recipes form a shared catalogue that projects schedule into meal slots.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Longest accepted recipe name
pub const MAX_RECIPE_NAME_LEN: usize = 100;

/// Unique identifier for a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(pub i32);

impl From<i32> for RecipeId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RecipeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a dietary speciality relates to a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryKind {
    /// The recipe contains the allergen
    Allergen,
    /// The recipe may contain traces of the allergen
    Trace,
    /// The recipe is explicitly free of the allergen
    FreeOf,
}

impl std::fmt::Display for DietaryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DietaryKind::Allergen => write!(f, "allergen"),
            DietaryKind::Trace => write!(f, "trace"),
            DietaryKind::FreeOf => write!(f, "free_of"),
        }
    }
}

impl std::str::FromStr for DietaryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "allergen" => Ok(DietaryKind::Allergen),
            "trace" => Ok(DietaryKind::Trace),
            "free_of" => Ok(DietaryKind::FreeOf),
            _ => Err(format!("Unknown dietary kind: {}", s)),
        }
    }
}

/// An ingredient line of a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub name: String,
    /// Grouping used for shopping lists (e.g. "Gemüse")
    #[serde(default)]
    pub ingredient_group: String,
    pub amount: f64,
    pub unit: String,
}

/// Everything about a recipe that can be edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeContent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Number of people the ingredient amounts are meant for
    pub number_of_people: i32,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub traces: Vec<String>,
    #[serde(default, alias = "freeOfAllergen")]
    pub free_of_allergens: Vec<String>,
    /// Instruction steps in cooking order
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

impl RecipeContent {
    pub fn validate(&self) -> Result<(), DomainError> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > MAX_RECIPE_NAME_LEN {
            return Err(DomainError::Validation(format!(
                "Recipe name must be between 1 and {} characters",
                MAX_RECIPE_NAME_LEN
            )));
        }
        if self.number_of_people < 1 {
            return Err(DomainError::Validation(
                "A recipe must serve at least one person".to_string(),
            ));
        }
        if self.instructions.iter().any(|step| step.trim().is_empty()) {
            return Err(DomainError::Validation(
                "Instruction steps must not be empty".to_string(),
            ));
        }
        for ingredient in &self.ingredients {
            if ingredient.name.trim().is_empty() {
                return Err(DomainError::Validation(
                    "Ingredient names must not be empty".to_string(),
                ));
            }
            if !ingredient.amount.is_finite() || ingredient.amount < 0.0 {
                return Err(DomainError::Validation(format!(
                    "Amount of '{}' must not be negative",
                    ingredient.name
                )));
            }
        }
        Ok(())
    }

    /// All dietary specialities of the recipe tagged with their kind
    pub fn dietary_specialities(&self) -> Vec<(DietaryKind, &str)> {
        [
            (DietaryKind::Allergen, &self.allergens),
            (DietaryKind::Trace, &self.traces),
            (DietaryKind::FreeOf, &self.free_of_allergens),
        ]
        .into_iter()
        .flat_map(|(kind, names)| names.iter().map(move |name| (kind, name.as_str())))
        .collect()
    }
}

/// A stored recipe
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: RecipeId,
    pub version: i32,
    pub image_version: i32,
    pub image_uri: Option<String>,
    pub content: RecipeContent,
}

/// Catalogue listing entry
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeStub {
    pub id: RecipeId,
    pub name: String,
    pub description: String,
    pub number_of_people: i32,
    pub version: i32,
    pub image_version: i32,
}
