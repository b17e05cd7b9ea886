//! Project domain entity
//!
//! A project is one campout whose meal plan a group edits together.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::recipe::RecipeId;
use crate::error::DomainError;

/// Longest accepted project name
pub const MAX_PROJECT_NAME_LEN: usize = 100;

/// Unique identifier for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i32);

impl From<i32> for ProjectId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A person with allergies whose presence window matters for the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergenPerson {
    pub name: String,
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    /// First meal the person eats with the group
    pub arrival_meal: String,
    /// Last meal the person eats with the group
    pub departure_meal: String,
    #[serde(default, alias = "allergen")]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub traces: Vec<String>,
}

/// A catalogue recipe scheduled for a meal slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeForProject {
    pub date: NaiveDate,
    pub meal: String,
    #[serde(alias = "recipeID")]
    pub recipe_id: RecipeId,
    /// Whether this is the main recipe of the slot (at most one per slot)
    pub main_recipe: bool,
}

/// Project specific conversion between two units of an ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitConversion {
    pub start_unit: String,
    pub end_unit: String,
    pub ingredient: String,
    pub factor: f64,
}

/// People arriving (positive) or leaving (negative) right before a meal slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonNumberChange {
    pub date: NaiveDate,
    pub meal: String,
    pub difference_before: i32,
}

/// Everything about a project that participants can edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContent {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Meal names in the order they happen during a day
    #[serde(default)]
    pub meals: Vec<String>,
    #[serde(default)]
    pub allergen_people: Vec<AllergenPerson>,
    #[serde(default)]
    pub recipes: Vec<RecipeForProject>,
    #[serde(default)]
    pub unit_conversions: Vec<UnitConversion>,
    #[serde(default, alias = "personNumberChange")]
    pub person_number_changes: Vec<PersonNumberChange>,
}

impl ProjectContent {
    /// Check every invariant of the plan that does not need the database.
    pub fn validate(&self) -> Result<(), DomainError> {
        let name = self.name.trim();
        if name.is_empty() || name.chars().count() > MAX_PROJECT_NAME_LEN {
            return Err(invalid(format!(
                "Project name must be between 1 and {} characters",
                MAX_PROJECT_NAME_LEN
            )));
        }
        if self.start_date > self.end_date {
            return Err(invalid("Start date must not be after end date"));
        }

        let mut meal_order = HashMap::new();
        for (index, meal) in self.meals.iter().enumerate() {
            if meal.trim().is_empty() {
                return Err(invalid("Meal names must not be empty"));
            }
            if meal_order.insert(meal.as_str(), index).is_some() {
                return Err(invalid(format!("Meal '{}' is listed twice", meal)));
            }
        }
        let meal_index = |meal: &str| {
            meal_order
                .get(meal)
                .copied()
                .ok_or_else(|| invalid(format!("Unknown meal '{}'", meal)))
        };

        let mut people = HashSet::new();
        for person in &self.allergen_people {
            if person.name.trim().is_empty() {
                return Err(invalid("Allergen person names must not be empty"));
            }
            if !people.insert(person.name.as_str()) {
                return Err(invalid(format!(
                    "Allergen person '{}' is listed twice",
                    person.name
                )));
            }
            self.check_date(person.arrival_date)?;
            self.check_date(person.departure_date)?;
            let arrival = meal_index(&person.arrival_meal)?;
            let departure = meal_index(&person.departure_meal)?;
            if (person.arrival_date, arrival) > (person.departure_date, departure) {
                return Err(invalid(format!(
                    "'{}' departs before arriving",
                    person.name
                )));
            }
        }

        let mut main_slots = HashSet::new();
        let mut scheduled = HashSet::new();
        for recipe in &self.recipes {
            self.check_date(recipe.date)?;
            meal_index(&recipe.meal)?;
            if recipe.main_recipe && !main_slots.insert((recipe.date, recipe.meal.as_str())) {
                return Err(invalid(format!(
                    "Meal slot {} {} has more than one main recipe",
                    recipe.date, recipe.meal
                )));
            }
            if !scheduled.insert((recipe.date, recipe.meal.as_str(), recipe.recipe_id)) {
                return Err(invalid(format!(
                    "Recipe {} is scheduled twice for {} {}",
                    recipe.recipe_id, recipe.date, recipe.meal
                )));
            }
        }

        for conversion in &self.unit_conversions {
            if conversion.start_unit.trim().is_empty() || conversion.end_unit.trim().is_empty() {
                return Err(invalid("Unit names must not be empty"));
            }
            if !conversion.factor.is_finite() || conversion.factor <= 0.0 {
                return Err(invalid(format!(
                    "Conversion factor for '{}' must be positive",
                    conversion.ingredient
                )));
            }
        }

        let mut changed_slots = HashSet::new();
        for change in &self.person_number_changes {
            self.check_date(change.date)?;
            meal_index(&change.meal)?;
            if !changed_slots.insert((change.date, change.meal.as_str())) {
                return Err(invalid(format!(
                    "Meal slot {} {} has more than one person number change",
                    change.date, change.meal
                )));
            }
        }

        Ok(())
    }

    /// Catalogue recipes referenced by the meal slots
    pub fn referenced_recipes(&self) -> BTreeSet<RecipeId> {
        self.recipes.iter().map(|r| r.recipe_id).collect()
    }

    fn check_date(&self, date: NaiveDate) -> Result<(), DomainError> {
        if date < self.start_date || date > self.end_date {
            return Err(invalid(format!(
                "Date {} is outside of the project ({} - {})",
                date, self.start_date, self.end_date
            )));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> DomainError {
    DomainError::Validation(msg.into())
}

/// A stored project
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub project_version: i32,
    pub image_version: i32,
    /// File name of the project picture
    pub image_uri: Option<String>,
    pub content: ProjectContent,
}

/// Summary shown in a user's project overview
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectStub {
    pub id: ProjectId,
    pub name: String,
    pub image_uri: Option<String>,
    pub project_version: i32,
    pub image_version: i32,
}

/// Current data and image version of a project or recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionNumbers {
    pub data_version: i32,
    pub image_version: i32,
}

/// Result of a participant leaving a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The user did not participate
    NotParticipant,
    /// Other participants remain
    Left,
    /// The last participant left and the project is gone
    Deleted { image_uri: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
    }

    fn content() -> ProjectContent {
        ProjectContent {
            name: "Sommerlager".to_string(),
            start_date: date(22),
            end_date: date(28),
            meals: vec!["Frühstück".to_string(), "Mittagessen".to_string()],
            allergen_people: vec![AllergenPerson {
                name: "Bob".to_string(),
                arrival_date: date(22),
                departure_date: date(25),
                arrival_meal: "Mittagessen".to_string(),
                departure_meal: "Frühstück".to_string(),
                allergens: vec!["Ei".to_string()],
                traces: vec!["Laktose".to_string()],
            }],
            recipes: vec![RecipeForProject {
                date: date(23),
                meal: "Mittagessen".to_string(),
                recipe_id: RecipeId(1),
                main_recipe: true,
            }],
            unit_conversions: vec![UnitConversion {
                start_unit: "EL".to_string(),
                end_unit: "g".to_string(),
                ingredient: "Zucker".to_string(),
                factor: 15.0,
            }],
            person_number_changes: vec![PersonNumberChange {
                date: date(24),
                meal: "Frühstück".to_string(),
                difference_before: -3,
            }],
        }
    }

    fn assert_invalid(content: ProjectContent, needle: &str) {
        match content.validate() {
            Err(DomainError::Validation(msg)) => {
                assert!(msg.contains(needle), "unexpected message: {}", msg)
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn valid_content_passes() {
        assert!(content().validate().is_ok());
    }

    #[test]
    fn rejects_blank_name() {
        let mut c = content();
        c.name = "  ".to_string();
        assert_invalid(c, "Project name");
    }

    #[test]
    fn rejects_reversed_dates() {
        let mut c = content();
        c.start_date = date(29);
        assert_invalid(c, "Start date");
    }

    #[test]
    fn rejects_duplicate_meals() {
        let mut c = content();
        c.meals.push("Frühstück".to_string());
        assert_invalid(c, "listed twice");
    }

    #[test]
    fn rejects_unknown_meal_in_slot() {
        let mut c = content();
        c.recipes[0].meal = "Abendessen".to_string();
        assert_invalid(c, "Unknown meal");
    }

    #[test]
    fn rejects_second_main_recipe_for_slot() {
        let mut c = content();
        let slot = c.recipes[0].clone();
        c.recipes.push(RecipeForProject {
            recipe_id: RecipeId(2),
            ..slot
        });
        assert_invalid(c, "more than one main recipe");
    }

    #[test]
    fn accepts_alternative_recipes_next_to_main() {
        let mut c = content();
        let slot = c.recipes[0].clone();
        c.recipes.push(RecipeForProject {
            recipe_id: RecipeId(2),
            main_recipe: false,
            ..slot.clone()
        });
        c.recipes.push(RecipeForProject {
            recipe_id: RecipeId(3),
            main_recipe: false,
            ..slot
        });
        assert!(c.validate().is_ok());
        assert_eq!(c.referenced_recipes().len(), 3);
    }

    #[test]
    fn rejects_dates_outside_project() {
        let mut c = content();
        c.person_number_changes[0].date = date(30);
        assert_invalid(c, "outside of the project");
    }

    #[test]
    fn rejects_departure_before_arrival_on_same_day() {
        let mut c = content();
        c.allergen_people[0].departure_date = date(22);
        assert_invalid(c, "departs before arriving");
    }

    #[test]
    fn rejects_non_positive_factor() {
        let mut c = content();
        c.unit_conversions[0].factor = 0.0;
        assert_invalid(c, "must be positive");
    }

    #[test]
    fn rejects_two_changes_for_one_slot() {
        let mut c = content();
        let change = c.person_number_changes[0].clone();
        c.person_number_changes.push(change);
        assert_invalid(c, "more than one person number change");
    }

    #[test]
    fn deserializes_client_field_names() {
        let json = r#"{
            "name": "Lager",
            "startDate": "2024-07-22",
            "endDate": "2024-07-23",
            "meals": ["Abendessen"],
            "allergenPeople": [{
                "name": "Bob",
                "arrivalDate": "2024-07-22",
                "departureDate": "2024-07-23",
                "arrivalMeal": "Abendessen",
                "departureMeal": "Abendessen",
                "allergen": ["Ei"],
                "traces": []
            }],
            "recipes": [{"date": "2024-07-22", "meal": "Abendessen", "recipeID": 4, "mainRecipe": true}],
            "personNumberChange": [{"date": "2024-07-23", "meal": "Abendessen", "differenceBefore": 2}]
        }"#;

        let c: ProjectContent = serde_json::from_str(json).unwrap();
        assert_eq!(c.allergen_people[0].allergens, vec!["Ei".to_string()]);
        assert_eq!(c.recipes[0].recipe_id, RecipeId(4));
        assert_eq!(c.person_number_changes[0].difference_before, 2);
        assert!(c.unit_conversions.is_empty());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn version_numbers_serialize_camel_case() {
        let json = serde_json::to_string(&VersionNumbers {
            data_version: 3,
            image_version: 1,
        })
        .unwrap();
        assert_eq!(json, r#"{"dataVersion":3,"imageVersion":1}"#);
    }
}
