//! Narration text assembly from generated meal plans

use serde::{Deserialize, Serialize};

/// One course of a generated meal plan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Course {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub summary: String,
    pub instructions: Vec<String>,
    pub wine_pairing: String,
    pub difficulty_notes: String,
}

/// Generated meal plan; only the fields narration reads are modelled
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MealPlan {
    pub id: String,
    pub title: String,
    pub identified_ingredients: Vec<String>,
    pub courses: Vec<Course>,
    pub total_time: String,
}

impl MealPlan {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Text read aloud for a plan: each course name followed by its steps.
///
/// Empty for a plan without courses.
pub fn narration_text(plan: &MealPlan) -> String {
    plan.courses
        .iter()
        .map(|course| format!("{}. {}", course.name, course.instructions.join(". ")))
        .collect::<Vec<_>>()
        .join(". ")
}
