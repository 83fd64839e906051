//! Recipe narration
//!
//! Contains the playback controller and narration text assembly.

pub mod controller;
pub mod script;

pub use controller::{
    NarrationController, NarrationSettings, OnEnded, SessionState, Synthesis, UnavailableReason,
};
pub use script::{narration_text, Course, MealPlan};
