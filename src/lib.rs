//! Random recipe browser for the Korean food safety recipe API.
//!
//! A [`RecipeSession`] holds the fetched batch, the selected recipe and the
//! carousel position. A [`ViewController`] maps user [`Control`]s onto the
//! session and drives any [`RecipeView`] implementation.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod nutrition;
pub mod session;
pub mod steps;
pub mod view;

pub use client::{RecipeClient, RecipeSource};
pub use config::BrowserConfig;
pub use error::{BrowserError, ErrorKind, FetchError};
pub use model::{RecipeBatch, RecipeRecord, MAX_STEPS};
pub use nutrition::{
    DailyPercent, DailyValueCalculator, Nutrient, NutritionCalculator, NutritionLine,
};
pub use session::{
    LoadFailure, LoadOutcome, NutritionLookup, RecipeSession, SessionPhase, SessionState,
    StepDirection,
};
pub use steps::{extract_steps, CookStep};
pub use view::{Control, MenuCard, RecipeSummary, RecipeView, Tab, TerminalView, ViewController};

